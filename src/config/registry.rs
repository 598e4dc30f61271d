use crate::config::profile::{AuthScheme, ServerProfile, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::config::workflow::WorkflowSettings;
use crate::utils::errors::{CertifyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// One `servers:` entry as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEntry {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub auth_scheme: AuthScheme,
    #[serde(default)]
    pub requires_empty_edit_payload: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
    #[serde(default)]
    pub workflow: WorkflowSettings,
}

/// Server profiles keyed by short name, loaded from an external file.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    config: ConfigFile,
}

impl ServerRegistry {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: ConfigFile = serde_yaml::from_str(content)?;
        for (key, entry) in &config.servers {
            if entry.base_url.trim().is_empty() {
                return Err(CertifyError::Config(format!(
                    "Server '{key}' has an empty base_url"
                )));
            }
            if entry.timeout_secs == 0 {
                return Err(CertifyError::Config(format!(
                    "Server '{key}' has a zero timeout"
                )));
            }
        }
        Ok(Self { config })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CertifyError::Config(format!(
                "No server configuration found at {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let registry = Self::from_yaml_str(&content)?;
        tracing::debug!(
            "Loaded {} server profiles from {}",
            registry.config.servers.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn keys(&self) -> Vec<String> {
        self.config.servers.keys().cloned().collect()
    }

    pub fn entry(&self, key: &str) -> Option<&ServerEntry> {
        self.config.servers.get(key)
    }

    pub fn workflow(&self) -> &WorkflowSettings {
        &self.config.workflow
    }

    /// Resolve a profile, reading tokens from the process environment
    pub fn profile(&self, key: &str) -> Result<ServerProfile> {
        self.resolve_with(key, |name| std::env::var(name).ok())
    }

    /// Resolve a profile with an explicit environment lookup.
    ///
    /// Token precedence: `CERTIFYME_TOKEN_<KEY>`, then the entry's `token_env`
    /// variable, then the literal `token` in the file.
    pub fn resolve_with<F>(&self, key: &str, lookup: F) -> Result<ServerProfile>
    where
        F: Fn(&str) -> Option<String>,
    {
        let entry = self
            .config
            .servers
            .get(key)
            .ok_or_else(|| CertifyError::ServerNotFound(key.to_string()))?;

        let token = lookup(&token_env_var(key))
            .filter(|t| !t.is_empty())
            .or_else(|| {
                entry
                    .token_env
                    .as_deref()
                    .and_then(&lookup)
                    .filter(|t| !t.is_empty())
            })
            .or_else(|| entry.token.clone().filter(|t| !t.is_empty()))
            .ok_or_else(|| {
                CertifyError::Config(format!(
                    "No token for server '{key}'. Set {} or add a token to the config file.",
                    token_env_var(key)
                ))
            })?;

        let mut profile = ServerProfile::new(key, entry.base_url.clone(), token)
            .with_timeout(Duration::from_secs(entry.timeout_secs))
            .with_auth_scheme(entry.auth_scheme)
            .with_empty_edit_payload(entry.requires_empty_edit_payload);
        profile.user_agent = entry
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(profile)
    }
}

/// Environment variable that overrides the token of a server profile
pub fn token_env_var(key: &str) -> String {
    let normalized: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("CERTIFYME_TOKEN_{normalized}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
servers:
  main:
    base_url: https://my.example.online/
    token: file-token
  apac:
    base_url: https://apac.example.dev
    token_env: APAC_SECRET
    timeout_secs: 60
    requires_empty_edit_payload: true
  us-east:
    base_url: https://us1.example.org
    auth_scheme: bearer
workflow:
  institution_id: "42"
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_keys_are_sorted() {
        let registry = ServerRegistry::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(registry.keys(), vec!["apac", "main", "us-east"]);
        assert_eq!(registry.workflow().institution_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_file_token_and_defaults() {
        let registry = ServerRegistry::from_yaml_str(SAMPLE).unwrap();
        let profile = registry.resolve_with("main", env(&[])).unwrap();
        assert_eq!(profile.base_url, "https://my.example.online");
        assert_eq!(profile.auth_token, "file-token");
        assert_eq!(profile.timeout, Duration::from_secs(30));
        assert_eq!(profile.auth_scheme, AuthScheme::Raw);
        assert!(!profile.requires_empty_edit_payload);
    }

    #[test]
    fn test_token_env_and_quirk_flag() {
        let registry = ServerRegistry::from_yaml_str(SAMPLE).unwrap();
        let profile = registry
            .resolve_with("apac", env(&[("APAC_SECRET", "apac-token")]))
            .unwrap();
        assert_eq!(profile.auth_token, "apac-token");
        assert_eq!(profile.timeout, Duration::from_secs(60));
        assert!(profile.requires_empty_edit_payload);
    }

    #[test]
    fn test_override_env_wins() {
        let registry = ServerRegistry::from_yaml_str(SAMPLE).unwrap();
        let profile = registry
            .resolve_with(
                "main",
                env(&[("CERTIFYME_TOKEN_MAIN", "override-token")]),
            )
            .unwrap();
        assert_eq!(profile.auth_token, "override-token");
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let registry = ServerRegistry::from_yaml_str(SAMPLE).unwrap();
        let err = registry.resolve_with("us-east", env(&[])).unwrap_err();
        assert!(matches!(err, CertifyError::Config(_)));
        assert!(err.to_string().contains("CERTIFYME_TOKEN_US_EAST"));
    }

    #[test]
    fn test_unknown_server() {
        let registry = ServerRegistry::from_yaml_str(SAMPLE).unwrap();
        assert!(matches!(
            registry.resolve_with("eu", env(&[])),
            Err(CertifyError::ServerNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let content = "servers:\n  main:\n    base_url: https://x\n    timeout_secs: 0\n";
        assert!(matches!(
            ServerRegistry::from_yaml_str(content),
            Err(CertifyError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("servers.yaml");
        assert!(matches!(
            ServerRegistry::load(&missing),
            Err(CertifyError::Config(_))
        ));
    }
}
