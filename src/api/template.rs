use crate::api::client::RequestResult;
use crate::api::handle::{ResourceHandle, ResourceKind};
use crate::api::{check_kind, ApiSession, CreateOutcome};
use serde_json::Value;

const TEMPLATE_PATH: &str = "/api/advanced/v2/template";

/// Template endpoints of the advanced API
pub struct TemplateApi<'a> {
    session: &'a ApiSession,
}

impl<'a> TemplateApi<'a> {
    pub fn new(session: &'a ApiSession) -> Self {
        Self { session }
    }

    pub async fn create(&self, payload: &Value) -> CreateOutcome {
        tracing::info!("Initiating template creation");
        self.session
            .create_resource(ResourceKind::Template, TEMPLATE_PATH, payload)
            .await
    }

    pub async fn get(&self, handle: &ResourceHandle) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Template) {
            return rejected;
        }
        self.session
            .get(&format!("{TEMPLATE_PATH}/{}", handle.id()))
            .await
    }

    pub async fn edit(&self, handle: &ResourceHandle, payload: Option<&Value>) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Template) {
            return rejected;
        }
        let body = self.session.edit_body(payload);
        self.session
            .put(&format!("{TEMPLATE_PATH}/edit/{}", handle.id()), &body)
            .await
    }

    pub async fn delete(&self, handle: &ResourceHandle) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Template) {
            return rejected;
        }
        self.session
            .delete_resource(handle, &format!("{TEMPLATE_PATH}/delete/{}", handle.id()))
            .await
    }

    /// Copy a template; the copy's identifier is not tracked
    pub async fn copy(&self, handle: &ResourceHandle, payload: &Value) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Template) {
            return rejected;
        }
        self.session
            .post(&format!("{TEMPLATE_PATH}/copy/{}", handle.id()), payload)
            .await
    }

    pub async fn list_all(&self, institution_id: &str) -> RequestResult {
        self.session
            .get(&format!("{TEMPLATE_PATH}/all/{institution_id}"))
            .await
    }

    /// Credentials issued from a template
    pub async fn credentials(&self, handle: &ResourceHandle) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Template) {
            return rejected;
        }
        self.session
            .get(&format!("{TEMPLATE_PATH}/credentials/{}", handle.id()))
            .await
    }
}
