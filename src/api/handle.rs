use crate::utils::errors::{CertifyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static SYNTHESIZED_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Credential,
    Template,
    Folder,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Credential => "credential",
            ResourceKind::Template => "template",
            ResourceKind::Folder => "folder",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a handle's identifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Read from a field of the server response
    Server,
    /// Made up locally because the response had no identifier
    Synthesized,
}

/// Identifier of one created resource, typed by resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    kind: ResourceKind,
    id: String,
    provenance: Provenance,
}

impl ResourceHandle {
    pub fn server(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            provenance: Provenance::Server,
        }
    }

    /// Placeholder for a create call that succeeded without returning an id.
    ///
    /// Unique within the process: wall-clock millis plus a sequence number.
    pub fn synthesize(kind: ResourceKind) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = SYNTHESIZED_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            kind,
            id: format!("local-{kind}-{millis}-{seq}"),
            provenance: Provenance::Synthesized,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_verified(&self) -> bool {
        self.provenance == Provenance::Server
    }

    /// Reject placeholder handles; nothing on the server answers to them
    pub fn require_verified(self) -> Result<Self> {
        if self.is_verified() {
            Ok(self)
        } else {
            Err(CertifyError::AmbiguousCreateOutcome {
                kind: self.kind.to_string(),
                placeholder: self.id,
            })
        }
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_ids_are_distinct() {
        let a = ResourceHandle::synthesize(ResourceKind::Credential);
        let b = ResourceHandle::synthesize(ResourceKind::Credential);
        assert!(!a.id().is_empty());
        assert!(a.id().starts_with("local-credential-"));
        assert_ne!(a.id(), b.id());
        assert!(!a.is_verified());
    }

    #[test]
    fn test_require_verified() {
        let handle = ResourceHandle::server(ResourceKind::Folder, "12");
        assert_eq!(handle.clone().require_verified().unwrap(), handle);

        let placeholder = ResourceHandle::synthesize(ResourceKind::Template);
        let err = placeholder.require_verified().unwrap_err();
        assert!(matches!(err, CertifyError::AmbiguousCreateOutcome { ref kind, .. } if kind == "template"));
    }
}
