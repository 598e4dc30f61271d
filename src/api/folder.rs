use crate::api::client::RequestResult;
use crate::api::handle::{ResourceHandle, ResourceKind};
use crate::api::{check_kind, ApiSession, CreateOutcome};
use chrono::Utc;
use serde_json::{json, Map, Value};

const FOLDER_PATH: &str = "/api/advanced/v2/folder";

/// Total create attempts when the folder name is already taken
pub const MAX_FOLDER_CREATE_ATTEMPTS: u32 = 5;

const NAME_COLLISION_PHRASE: &str = "already exists";

/// Folder (project manager) endpoints of the advanced API
pub struct FolderApi<'a> {
    session: &'a ApiSession,
}

impl<'a> FolderApi<'a> {
    pub fn new(session: &'a ApiSession) -> Self {
        Self { session }
    }

    /// Create a folder, renaming and retrying while the name collides.
    ///
    /// `extra` fields are merged into the payload next to `name`. Any error
    /// other than a name collision is returned after the first attempt.
    pub async fn create(&self, name: &str, extra: Option<&Value>) -> CreateOutcome {
        let mut attempt_name = name.to_string();
        let mut attempt = 1;

        loop {
            let payload = folder_payload(&attempt_name, extra);
            let outcome = self
                .session
                .create_resource(ResourceKind::Folder, FOLDER_PATH, &payload)
                .await;

            if outcome.succeeded || !is_name_collision(&outcome.result) {
                return outcome;
            }
            if attempt >= MAX_FOLDER_CREATE_ATTEMPTS {
                tracing::error!(
                    "Folder name '{name}' still collides after {attempt} attempts, giving up"
                );
                return outcome;
            }

            attempt += 1;
            attempt_name = renamed(name, attempt);
            tracing::warn!(
                "Folder name already exists, retrying as '{attempt_name}' (attempt {attempt}/{MAX_FOLDER_CREATE_ATTEMPTS})"
            );
        }
    }

    pub async fn get(&self, handle: &ResourceHandle) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Folder) {
            return rejected;
        }
        self.session
            .get(&format!("{FOLDER_PATH}/{}", handle.id()))
            .await
    }

    pub async fn list_all(&self, institution_id: &str) -> RequestResult {
        self.session
            .get(&format!("{FOLDER_PATH}/all/{institution_id}"))
            .await
    }

    pub async fn delete(&self, handle: &ResourceHandle) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Folder) {
            return rejected;
        }
        self.session
            .delete_resource(handle, &format!("{FOLDER_PATH}/{}", handle.id()))
            .await
    }
}

fn folder_payload(name: &str, extra: Option<&Value>) -> Value {
    let mut payload = match extra {
        Some(Value::Object(fields)) => fields.clone(),
        _ => Map::new(),
    };
    payload.insert("name".to_string(), json!(name));
    Value::Object(payload)
}

/// Time-based variant of a folder name
fn renamed(base: &str, attempt: u32) -> String {
    format!("{base}-{}-{attempt}", Utc::now().format("%Y%m%d%H%M%S%3f"))
}

fn is_name_collision(result: &RequestResult) -> bool {
    let in_message = result
        .error_message
        .as_deref()
        .is_some_and(|m| m.to_lowercase().contains(NAME_COLLISION_PHRASE));
    let in_body = result
        .body
        .as_ref()
        .is_some_and(|b| b.contains_text(NAME_COLLISION_PHRASE));

    in_message || in_body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{can_bind_localhost, mount_route, session_for};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_payload_merges_extra_fields() {
        let payload = folder_payload("Foo", Some(&json!({"institution_ID": 9, "name": "ignored"})));
        assert_eq!(payload, json!({"institution_ID": 9, "name": "Foo"}));
        assert_eq!(folder_payload("Foo", None), json!({"name": "Foo"}));
    }

    #[test]
    fn test_renamed_keeps_base() {
        let name = renamed("Foo", 2);
        assert!(name.starts_with("Foo-"));
        assert!(name.ends_with("-2"));
        assert_ne!(name, "Foo");
    }

    #[tokio::test]
    async fn test_collision_retries_are_bounded() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/advanced/v2/folder"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"message": "Folder with this name already exists"})),
            )
            .expect(u64::from(MAX_FOLDER_CREATE_ATTEMPTS))
            .mount(&server)
            .await;

        let outcome = session_for(&server).folders().create("Foo", None).await;
        assert!(!outcome.succeeded);
        assert!(outcome.handle.is_none());

        let requests = server.received_requests().await.unwrap();
        let names: Vec<String> = requests
            .iter()
            .map(|r| r.body_json::<Value>().unwrap()["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names.len(), 5);
        assert_eq!(names[0], "Foo");
        for renamed in &names[1..] {
            assert!(renamed.starts_with("Foo-"), "{renamed}");
        }
    }

    #[tokio::test]
    async fn test_collision_then_success() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/advanced/v2/folder"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Folder ALREADY EXISTS"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_route(&server, "POST", "/api/advanced/v2/folder", 201, Some(json!({"id": 31}))).await;

        let outcome = session_for(&server).folders().create("Foo", None).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.id(), Some("31"));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_do_not_retry() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/advanced/v2/folder"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = session_for(&server).folders().create("Foo", None).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.result.status_code, 401);
    }
}
