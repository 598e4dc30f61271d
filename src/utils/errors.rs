use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertifyError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server profile not found: {0}")]
    ServerNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{kind} was created but the response carried no usable identifier (placeholder {placeholder})")]
    AmbiguousCreateOutcome { kind: String, placeholder: String },
}

pub type Result<T> = std::result::Result<T, CertifyError>;
