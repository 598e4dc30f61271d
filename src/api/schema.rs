//! Response-shape adapters for the vendor API.
//!
//! Create endpoints do not agree on where the new identifier lives. Each
//! supported API version lists the fields to probe, in priority order.

use crate::api::client::ResponseBody;
use crate::api::handle::ResourceKind;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V2,
}

const V2_CREDENTIAL_FIELDS: &[&str] = &[
    "credential_UID",
    "id",
    "credential_id",
    "credentialId",
    "resource_id",
];
const V2_TEMPLATE_FIELDS: &[&str] = &[
    "template_ID",
    "id",
    "template_id",
    "templateId",
    "resource_id",
];
const V2_FOLDER_FIELDS: &[&str] = &["folder_ID", "id", "folder_id", "folderId", "resource_id"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSchema {
    version: ApiVersion,
}

impl ResponseSchema {
    pub fn new(version: ApiVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn id_fields(&self, kind: ResourceKind) -> &'static [&'static str] {
        match (self.version, kind) {
            (ApiVersion::V2, ResourceKind::Credential) => V2_CREDENTIAL_FIELDS,
            (ApiVersion::V2, ResourceKind::Template) => V2_TEMPLATE_FIELDS,
            (ApiVersion::V2, ResourceKind::Folder) => V2_FOLDER_FIELDS,
        }
    }

    /// Find the identifier of a freshly created resource.
    ///
    /// Top-level fields win over the same fields inside a `data` envelope.
    pub fn extract_id(&self, kind: ResourceKind, body: &ResponseBody) -> Option<String> {
        let value = body.as_json()?;
        let fields = self.id_fields(kind);

        probe(value, fields).or_else(|| probe(value.get("data")?, fields))
    }
}

fn probe(value: &Value, fields: &[&str]) -> Option<String> {
    let object = value.as_object()?;
    fields
        .iter()
        .filter_map(|field| object.get(*field))
        .find_map(id_string)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
