use crate::utils::errors::Result;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Status codes the API uses for a successful call
pub const SUCCESS_CODES: [u16; 4] = [200, 201, 202, 204];

pub const STATUS_CLIENT_ERROR: u16 = 400;
pub const STATUS_TIMEOUT: u16 = 408;
pub const STATUS_INTERNAL: u16 = 500;
pub const STATUS_UNREACHABLE: u16 = 503;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(format!("Unsupported HTTP method: {s}")),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response payload: parsed JSON when possible, the raw text otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Raw(String),
}

impl ResponseBody {
    fn parse(text: String) -> Self {
        if text.trim().is_empty() {
            return ResponseBody::Json(json!({}));
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    /// The `message` field the API puts on error responses
    pub fn message(&self) -> Option<&str> {
        self.as_json()?.get("message")?.as_str()
    }

    /// Case-insensitive search over the whole body
    pub fn contains_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        match self {
            ResponseBody::Json(value) => value.to_string().to_lowercase().contains(&needle),
            ResponseBody::Raw(text) => text.to_lowercase().contains(&needle),
        }
    }

    /// JSON view of the body, wrapping raw text as `{"raw_response": ...}`
    pub fn to_value(&self) -> Value {
        match self {
            ResponseBody::Json(value) => value.clone(),
            ResponseBody::Raw(text) => json!({ "raw_response": text }),
        }
    }
}

/// Why a request did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnsupportedMethod,
    InvalidHandle,
    Timeout,
    Unreachable,
    Http,
    Internal,
}

/// Uniform outcome of one API call.
#[derive(Debug, Clone)]
pub struct RequestResult {
    pub succeeded: bool,
    pub status_code: u16,
    pub body: Option<ResponseBody>,
    pub error_message: Option<String>,
    pub failure: Option<FailureKind>,
}

impl RequestResult {
    pub(crate) fn from_response(status_code: u16, body: ResponseBody) -> Self {
        let succeeded = SUCCESS_CODES.contains(&status_code);
        let (error_message, failure) = if succeeded {
            (None, None)
        } else {
            (
                Some(body.message().unwrap_or("Unknown error").to_string()),
                Some(FailureKind::Http),
            )
        };

        Self {
            succeeded,
            status_code,
            body: Some(body),
            error_message,
            failure,
        }
    }

    pub(crate) fn failed(failure: FailureKind, status_code: u16, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            status_code,
            body: None,
            error_message: Some(message.into()),
            failure: Some(failure),
        }
    }

    pub fn json(&self) -> Option<&Value> {
        self.body.as_ref()?.as_json()
    }

    /// One-line description for step logs
    pub fn summary(&self) -> String {
        match &self.error_message {
            Some(message) => format!("{} - {message}", self.status_code),
            None => self.status_code.to_string(),
        }
    }
}

/// Create a standardized HTTP client
pub fn create_http_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .use_rustls_tls() // Use rustls with system certificate store
        .build()?)
}

/// Thin request wrapper: one call in, one `RequestResult` out, no retries.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: create_http_client(timeout, user_agent)?,
        })
    }

    /// Issue a request with a method given by name.
    ///
    /// Unknown methods come back as a 400 result without touching the network.
    pub async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&Value>,
    ) -> RequestResult {
        match method.parse::<HttpMethod>() {
            Ok(method) => self.send(method, url, headers, body).await,
            Err(message) => {
                tracing::error!("{message}");
                RequestResult::failed(FailureKind::UnsupportedMethod, STATUS_CLIENT_ERROR, message)
            }
        }
    }

    pub async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&Value>,
    ) -> RequestResult {
        tracing::info!("Making {method} request to {url}");

        let mut builder = self.client.request(method.as_reqwest(), url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = body {
            builder = builder.json(payload);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return classify_transport_error(&e),
        };

        let result = RequestResult::from_response(status, ResponseBody::parse(text));
        if result.succeeded {
            tracing::info!("Response: {status} - Success");
        } else {
            tracing::error!(
                "Response: {status} - Failed: {}",
                result.error_message.as_deref().unwrap_or("Unknown error")
            );
        }
        result
    }
}

fn classify_transport_error(error: &reqwest::Error) -> RequestResult {
    if error.is_timeout() {
        tracing::error!("Request timeout: {error}");
        RequestResult::failed(FailureKind::Timeout, STATUS_TIMEOUT, "Request timeout")
    } else if error.is_connect() {
        tracing::error!("Connection error: {error}");
        RequestResult::failed(
            FailureKind::Unreachable,
            STATUS_UNREACHABLE,
            "Connection error - unable to reach API server",
        )
    } else {
        tracing::error!("Unexpected error: {error}");
        RequestResult::failed(
            FailureKind::Internal,
            STATUS_INTERNAL,
            format!("Unexpected error: {error}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::can_bind_localhost;
    use std::net::TcpListener;
    use wiremock::matchers::{any, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ApiClient {
        ApiClient::new(Duration::from_secs(5), "certifyme-rs-test").unwrap()
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("Delete".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_body_parsing() {
        assert_eq!(ResponseBody::parse(String::new()), ResponseBody::Json(json!({})));
        assert_eq!(
            ResponseBody::parse("{\"id\": 3}".to_string()),
            ResponseBody::Json(json!({"id": 3}))
        );
        assert_eq!(
            ResponseBody::parse("<html>oops</html>".to_string()),
            ResponseBody::Raw("<html>oops</html>".to_string())
        );
    }

    #[test]
    fn test_error_message_from_body() {
        let result = RequestResult::from_response(422, ResponseBody::Json(json!({"message": "bad"})));
        assert!(!result.succeeded);
        assert_eq!(result.error_message.as_deref(), Some("bad"));
        assert_eq!(result.failure, Some(FailureKind::Http));

        let result = RequestResult::from_response(500, ResponseBody::Raw("boom".to_string()));
        assert_eq!(result.error_message.as_deref(), Some("Unknown error"));
    }

    #[tokio::test]
    async fn test_success_follows_status_code() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let client = client();

        for status in [200u16, 201, 202, 204, 400, 401, 404, 409, 500] {
            let route = format!("/status/{status}");
            Mock::given(path(route.as_str()))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            for verb in ["GET", "POST", "PUT", "DELETE"] {
                let url = format!("{}{route}", server.uri());
                let result = client.request(verb, &url, &HashMap::new(), None).await;
                assert_eq!(result.status_code, status, "{verb} {status}");
                assert_eq!(result.succeeded, SUCCESS_CODES.contains(&status), "{verb} {status}");
            }
        }
    }

    #[tokio::test]
    async fn test_unsupported_method_makes_no_call() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let url = format!("{}/api/v2/credential", server.uri());
        let result = client().request("PATCH", &url, &HashMap::new(), None).await;

        assert!(!result.succeeded);
        assert_eq!(result.status_code, 400);
        assert_eq!(result.failure, Some(FailureKind::UnsupportedMethod));
        assert!(result.body.is_none());
    }

    #[tokio::test]
    async fn test_headers_and_json_body_are_sent() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/credential"))
            .and(header("Authorization", "raw-token"))
            .and(wiremock::matchers::body_json(json!({"name": "Ada"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"credential_UID": "X"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "raw-token".to_string());
        let url = format!("{}/api/v2/credential", server.uri());
        let result = client()
            .request("post", &url, &headers, Some(&json!({"name": "Ada"})))
            .await;

        assert!(result.succeeded);
        assert_eq!(result.json(), Some(&json!({"credential_UID": "X"})));
    }

    #[tokio::test]
    async fn test_non_json_body_is_kept_raw() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let result = client()
            .request("GET", &server.uri(), &HashMap::new(), None)
            .await;

        assert!(!result.succeeded);
        assert_eq!(result.body, Some(ResponseBody::Raw("Bad Gateway".to_string())));
        assert_eq!(
            result.body.as_ref().map(|b| b.to_value()),
            Some(json!({"raw_response": "Bad Gateway"}))
        );
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = ApiClient::new(Duration::from_millis(200), "certifyme-rs-test").unwrap();
        let result = client
            .request("GET", &server.uri(), &HashMap::new(), None)
            .await;

        assert!(!result.succeeded);
        assert_eq!(result.status_code, STATUS_TIMEOUT);
        assert_eq!(result.failure, Some(FailureKind::Timeout));
    }

    #[tokio::test]
    async fn test_unreachable_is_classified() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        // Grab a free port and release it so nothing is listening there
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let url = format!("http://127.0.0.1:{port}/api/v2/credential");
        let result = client().request("GET", &url, &HashMap::new(), None).await;

        assert!(!result.succeeded);
        assert_eq!(result.status_code, STATUS_UNREACHABLE);
        assert_eq!(result.failure, Some(FailureKind::Unreachable));
    }

    #[tokio::test]
    async fn test_malformed_url_is_internal() {
        let result = client()
            .request("GET", "not a url", &HashMap::new(), None)
            .await;

        assert!(!result.succeeded);
        assert_eq!(result.status_code, STATUS_INTERNAL);
        assert_eq!(result.failure, Some(FailureKind::Internal));
    }
}
