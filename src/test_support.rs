use crate::api::ApiSession;
use crate::config::ServerProfile;
use serde_json::Value;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-token-0123456789";

pub fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

pub fn profile_for(server: &MockServer) -> ServerProfile {
    ServerProfile::new("test", server.uri(), TEST_TOKEN).with_timeout(Duration::from_secs(5))
}

pub fn session_for(server: &MockServer) -> ApiSession {
    ApiSession::new(profile_for(server)).expect("session")
}

/// Mount a single route answering with `status` and an optional JSON body
pub async fn mount_route(
    server: &MockServer,
    verb: &str,
    route: &str,
    status: u16,
    body: Option<Value>,
) {
    let mut response = ResponseTemplate::new(status);
    if let Some(body) = body {
        response = response.set_body_json(body);
    }
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}
