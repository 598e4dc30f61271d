use crate::api::ApiSession;
use std::fmt;

/// Cheap read-only endpoints used to probe a token
const PROBE_PATHS: &[&str] = &[
    "/api/advanced/v2/folder/all/test",
    "/api/advanced/v2/template/all/test",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid { endpoint: String, status: u16 },
    Expired { endpoint: String },
    Invalid { reason: String },
}

impl TokenStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenStatus::Valid { .. })
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStatus::Valid { endpoint, status } => {
                write!(f, "Token valid ({status} from {endpoint})")
            }
            TokenStatus::Expired { endpoint } => {
                write!(f, "Token expired or rejected (401 from {endpoint})")
            }
            TokenStatus::Invalid { reason } => write!(f, "Token check failed: {reason}"),
        }
    }
}

/// Check whether the session's token is accepted.
///
/// 401 means the token is rejected; 200 and 404 both mean the request got
/// past authentication. Anything else moves on to the next probe endpoint.
pub async fn check_token(session: &ApiSession) -> TokenStatus {
    let mut last_reason = String::from("no probe endpoints answered");

    for endpoint in PROBE_PATHS {
        tracing::debug!("Probing token against {endpoint}");
        let result = session.get(endpoint).await;

        match result.status_code {
            401 => {
                return TokenStatus::Expired {
                    endpoint: endpoint.to_string(),
                }
            }
            200 | 404 => {
                return TokenStatus::Valid {
                    endpoint: endpoint.to_string(),
                    status: result.status_code,
                }
            }
            status => {
                tracing::warn!("Unexpected status {status} from {endpoint}");
                last_reason = format!("{endpoint}: {}", result.summary());
            }
        }
    }

    TokenStatus::Invalid {
        reason: last_reason,
    }
}
