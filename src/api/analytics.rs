use crate::api::client::RequestResult;
use crate::api::handle::{ResourceHandle, ResourceKind};
use crate::api::{check_kind, ApiSession};

pub struct AnalyticsApi<'a> {
    session: &'a ApiSession,
}

impl<'a> AnalyticsApi<'a> {
    pub fn new(session: &'a ApiSession) -> Self {
        Self { session }
    }

    /// Issuance analytics for one template
    pub async fn template(&self, handle: &ResourceHandle) -> RequestResult {
        if let Some(rejected) = check_kind(handle, ResourceKind::Template) {
            return rejected;
        }
        self.session
            .get(&format!("/api/advanced/v2/analytics/template/{}", handle.id()))
            .await
    }
}
