//! Mock Jolokia agent for testing
//!
//! A wiremock server answering POSTs on the agent endpoint, so the HTTP
//! backend can be exercised without a JVM.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{basic_auth, body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const AGENT_PATH: &str = "/jolokia/";

/// Mock agent server that simulates Jolokia responses
pub struct MockAgentServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockAgentServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Full agent URL to configure on requests
    pub fn agent_url(&self) -> String {
        format!("{}{}", self.base_url, AGENT_PATH)
    }

    /// Answer any request with a protocol-level success carrying `value`
    pub async fn mock_read_success(&self, value: Value) {
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .and(header("content-type", "text/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "timestamp": 1_700_000_000,
                "value": value
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer only when the wire body equals `expected`
    pub async fn mock_expect_body(&self, expected: Value) {
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .and(body_json(expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "value": "matched"
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Protocol error: HTTP 200 whose body carries a non-200 status
    pub async fn mock_protocol_error(&self, status: u16, error: &str) {
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": status,
                "error": error,
                "error_type": "javax.management.InstanceNotFoundException"
            })))
            .mount(&self.server)
            .await;
    }

    /// Transport error: the HTTP exchange itself fails
    pub async fn mock_http_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Successful HTTP exchange with an empty body
    pub async fn mock_empty_body(&self) {
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    /// Success that only arrives after `delay`
    pub async fn mock_slow(&self, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": 200, "value": "late"}))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Success only for requests carrying the given basic-auth credentials
    pub async fn mock_requires_auth(&self, user: &str, password: &str) {
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .and(basic_auth(user, password))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "value": "authorized"
            })))
            .with_priority(1)
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the agent has seen
    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
