use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("certifyme-rs/", env!("CARGO_PKG_VERSION"));

/// How the token is placed in the `Authorization` header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// The raw token is the whole header value (what most deployments expect)
    #[default]
    Raw,
    Bearer,
    Token,
}

impl AuthScheme {
    pub fn header_value(&self, token: &str) -> String {
        match self {
            AuthScheme::Raw => token.to_string(),
            AuthScheme::Bearer => format!("Bearer {token}"),
            AuthScheme::Token => format!("Token {token}"),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthScheme::Raw => "raw",
            AuthScheme::Bearer => "bearer",
            AuthScheme::Token => "token",
        };
        f.write_str(name)
    }
}

/// One regional deployment of the API, resolved and ready to use.
#[derive(Clone)]
pub struct ServerProfile {
    pub key: String,
    pub base_url: String,
    pub auth_token: String,
    pub timeout: Duration,
    pub auth_scheme: AuthScheme,
    /// Some deployments reject a populated body on the edit endpoints
    pub requires_empty_edit_payload: bool,
    pub user_agent: String,
}

impl ServerProfile {
    pub fn new(key: impl Into<String>, base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            auth_scheme: AuthScheme::default(),
            requires_empty_edit_payload: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auth_scheme(mut self, auth_scheme: AuthScheme) -> Self {
        self.auth_scheme = auth_scheme;
        self
    }

    pub fn with_empty_edit_payload(mut self, required: bool) -> Self {
        self.requires_empty_edit_payload = required;
        self
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        self.auth_scheme.header_value(&self.auth_token)
    }

    /// Token prefix safe for logs
    pub fn masked_token(&self) -> String {
        let prefix: String = self.auth_token.chars().take(8).collect();
        format!("{prefix}***")
    }

    /// Short sha256 fingerprint so tokens can be compared without printing them
    pub fn token_fingerprint(&self) -> String {
        let digest = Sha256::digest(self.auth_token.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl fmt::Debug for ServerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProfile")
            .field("key", &self.key)
            .field("base_url", &self.base_url)
            .field("auth_token", &self.masked_token())
            .field("timeout", &self.timeout)
            .field("auth_scheme", &self.auth_scheme)
            .field("requires_empty_edit_payload", &self.requires_empty_edit_payload)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_scheme_header_values() {
        assert_eq!(AuthScheme::Raw.header_value("abc"), "abc");
        assert_eq!(AuthScheme::Bearer.header_value("abc"), "Bearer abc");
        assert_eq!(AuthScheme::Token.header_value("abc"), "Token abc");
    }

    #[test]
    fn test_url_joins_paths() {
        let profile = ServerProfile::new("main", "https://api.example.test/", "tok");
        assert_eq!(
            profile.url("/api/v2/credential"),
            "https://api.example.test/api/v2/credential"
        );
        assert_eq!(
            profile.url("api/v2/credential"),
            "https://api.example.test/api/v2/credential"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let profile = ServerProfile::new("main", "https://api.example.test", "supersecrettoken");
        let rendered = format!("{profile:?}");
        assert!(rendered.contains("supersec***"));
        assert!(!rendered.contains("supersecrettoken"));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = ServerProfile::new("a", "https://x", "token-1");
        let b = ServerProfile::new("b", "https://y", "token-1");
        let c = ServerProfile::new("c", "https://z", "token-2");
        assert_eq!(a.token_fingerprint(), b.token_fingerprint());
        assert_ne!(a.token_fingerprint(), c.token_fingerprint());
        assert_eq!(a.token_fingerprint().len(), 12);
    }
}
