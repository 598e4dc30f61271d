use crate::api::client::RequestResult;
use crate::api::handle::{ResourceHandle, ResourceKind};
use crate::api::{check_kind, ApiSession, CreateOutcome};
use serde_json::Value;

const CREDENTIAL_PATH: &str = "/api/v2/credential";

/// Credential endpoints of the basic API
pub struct CredentialApi<'a> {
    session: &'a ApiSession,
}

impl<'a> CredentialApi<'a> {
    pub fn new(session: &'a ApiSession) -> Self {
        Self { session }
    }

    fn item_path(handle: &ResourceHandle) -> String {
        format!("{CREDENTIAL_PATH}/{}", handle.id())
    }

    pub async fn create(&self, payload: &Value) -> CreateOutcome {
        tracing::info!("Initiating credential creation");
        self.session
            .create_resource(ResourceKind::Credential, CREDENTIAL_PATH, payload)
            .await
    }

    pub async fn get(&self, handle: &ResourceHandle) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Credential) {
            return rejected;
        }
        tracing::info!("Retrieving credential | ID: {}", handle.id());
        self.session.get(&Self::item_path(handle)).await
    }

    pub async fn edit(&self, handle: &ResourceHandle, payload: Option<&Value>) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Credential) {
            return rejected;
        }
        tracing::info!("Editing credential | ID: {}", handle.id());
        let body = self.session.edit_body(payload);
        self.session.put(&Self::item_path(handle), &body).await
    }

    pub async fn delete(&self, handle: &ResourceHandle) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Credential) {
            return rejected;
        }
        tracing::info!("Deleting credential | ID: {}", handle.id());
        self.session
            .delete_resource(handle, &Self::item_path(handle))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{can_bind_localhost, mount_route, session_for};
    use serde_json::json;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_create_reads_credential_uid() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        mount_route(&server, "POST", "/api/v2/credential", 201, Some(json!({"credential_UID": "X"}))).await;

        let session = session_for(&server);
        let outcome = session
            .credentials()
            .create(&json!({"template_ID": "26613", "name": "karan"}))
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.id(), Some("X"));
        assert!(outcome.handle.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_create_without_identifier_synthesizes() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        mount_route(&server, "POST", "/api/v2/credential", 201, Some(json!({}))).await;

        let session = session_for(&server);
        let first = session.credentials().create(&json!({})).await;
        let second = session.credentials().create(&json!({})).await;

        assert!(first.succeeded);
        let first_id = first.id().unwrap().to_string();
        assert!(!first_id.is_empty());
        assert_ne!(Some(first_id.as_str()), second.id());
        assert!(!first.handle.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_create_failure_has_no_handle() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        mount_route(
            &server,
            "POST",
            "/api/v2/credential",
            400,
            Some(json!({"message": "template_ID is required"})),
        )
        .await;

        let outcome = session_for(&server).credentials().create(&json!({})).await;
        assert!(!outcome.succeeded);
        assert!(outcome.handle.is_none());
        assert_eq!(
            outcome.result.error_message.as_deref(),
            Some("template_ID is required")
        );
    }
}
