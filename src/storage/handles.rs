use crate::api::handle::ResourceKind;
use crate::utils::errors::{CertifyError, Result};
use crate::utils::paths::AppPaths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Last created identifiers for one server profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedHandles {
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CachedHandles {
    pub fn get(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Template => self.template_id.as_deref(),
            ResourceKind::Credential => self.credential_id.as_deref(),
            ResourceKind::Folder => self.folder_id.as_deref(),
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut Option<String> {
        match kind {
            ResourceKind::Template => &mut self.template_id,
            ResourceKind::Credential => &mut self.credential_id,
            ResourceKind::Folder => &mut self.folder_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.template_id.is_none() && self.credential_id.is_none() && self.folder_id.is_none()
    }
}

/// Best-effort JSON cache of handles, one file per server profile.
///
/// Read once when opened and rewritten after every change. The server stays
/// the source of truth.
pub struct HandleCache {
    path: PathBuf,
    state: Mutex<CachedHandles>,
}

impl HandleCache {
    /// Open the cache for a server in the default data directory
    pub fn for_server(server_key: &str) -> Result<Self> {
        Self::open(&AppPaths::handle_cache_dir()?, server_key)
    }

    pub fn open(cache_dir: &Path, server_key: &str) -> Result<Self> {
        validate_server_key(server_key)?;
        AppPaths::ensure_dir_exists(cache_dir)?;
        let path = cache_file_path(cache_dir, server_key);
        let handles = load_file(&path)?;

        Ok(Self {
            path,
            state: Mutex::new(handles),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> CachedHandles {
        self.lock().clone()
    }

    /// Remember the latest identifier for a resource kind
    pub fn record(&self, kind: ResourceKind, id: &str) -> Result<()> {
        let mut handles = self.lock();
        *handles.slot(kind) = Some(id.to_string());
        handles.updated_at = Some(Utc::now());
        self.save(&handles)
    }

    /// Forget a deleted identifier. Returns whether the cache held it.
    pub fn invalidate(&self, kind: ResourceKind, id: &str) -> Result<bool> {
        let mut handles = self.lock();
        if handles.get(kind) != Some(id) {
            return Ok(false);
        }
        *handles.slot(kind) = None;
        handles.updated_at = Some(Utc::now());
        self.save(&handles)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        let mut handles = self.lock();
        *handles = CachedHandles::default();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, CachedHandles> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, handles: &CachedHandles) -> Result<()> {
        let content = serde_json::to_string_pretty(handles)
            .map_err(|e| CertifyError::Storage(format!("Cache serialization error: {e}")))?;

        fs::write(&self.path, content)?;
        tracing::debug!("Saved handle cache {}", self.path.display());
        Ok(())
    }
}

/// Server keys become file names; keep them inside the cache directory
fn validate_server_key(server_key: &str) -> Result<()> {
    let valid = !server_key.is_empty()
        && !server_key.starts_with('.')
        && server_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CertifyError::InvalidInput(format!(
            "Invalid server key '{server_key}': use letters, digits, '-', '_' or '.'"
        )))
    }
}

fn cache_file_path(cache_dir: &Path, server_key: &str) -> PathBuf {
    cache_dir.join(format!("{server_key}.json"))
}

fn load_file(path: &Path) -> Result<CachedHandles> {
    if !path.exists() {
        return Ok(CachedHandles::default());
    }

    let content = fs::read_to_string(path)?;
    match serde_json::from_str::<CachedHandles>(&content) {
        Ok(handles) => Ok(handles),
        Err(e) => {
            tracing::warn!(
                "Cache parsing error for '{}': {}. Clearing corrupted cache.",
                path.display(),
                e
            );
            if let Err(remove_err) = fs::remove_file(path) {
                tracing::error!("Failed to remove corrupted cache file: {}", remove_err);
            }
            Ok(CachedHandles::default())
        }
    }
}

/// All cached handle files in a directory, sorted by server key
pub fn list_cached(cache_dir: &Path) -> Result<Vec<(String, CachedHandles)>> {
    if !cache_dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(cache_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(key) = path.file_stem().and_then(|s| s.to_str()) {
            entries.push((key.to_string(), load_file(&path)?));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Remove every cached handle file. Returns how many were removed.
pub fn clear_all(cache_dir: &Path) -> Result<usize> {
    let mut cleared = 0;
    for (key, _) in list_cached(cache_dir)? {
        let path = cache_file_path(cache_dir, &key);
        if path.exists() {
            fs::remove_file(&path)?;
            cleared += 1;
        }
    }
    Ok(cleared)
}
