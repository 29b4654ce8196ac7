// File: client/src/http/backend.rs
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::TransportBackend;
use crate::config::{EffectiveOptions, Method};
use crate::constants::http;
use crate::errors::TransportError;
use crate::message::{Message, Request, WirePayload};

/// Default backend: POSTs the encoded request to the agent with reqwest
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    /// Backend with a connect timeout; falls back to a default client if that cannot be built
    pub fn new() -> Self {
        Self::try_new().unwrap_or_else(|e| {
            warn!("{}; using a default client without connect timeout", e);
            Self {
                client: Client::new(),
            }
        })
    }

    pub fn try_new() -> Result<Self, TransportError> {
        // Per-request deadlines come from the dispatch timer, not the client
        let client = Client::builder()
            .connect_timeout(http::CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn exchange(
        &self,
        request: &Request,
        options: &EffectiveOptions,
    ) -> Result<WirePayload, TransportError> {
        if options.method != Method::Post {
            return Err(TransportError::Other(
                "Only POST requests are currently implemented".to_string(),
            ));
        }
        if !options.asynchronous {
            debug!("http backend has no synchronous mode; dispatching asynchronously");
        }

        let body = request
            .to_wire_string(None)
            .map_err(|e| TransportError::Encode {
                reason: e.to_string(),
            })?;

        info!("Sending {} request to {}", options.method, options.url);

        let mut builder = self
            .client
            .post(&options.url)
            .header(CONTENT_TYPE, http::CONTENT_TYPE)
            .body(body);

        if let Some((name, password)) = options.credentials() {
            builder = builder.basic_auth(name, password);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                url: options.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                method: options.method.to_string(),
                url: options.url.clone(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                url: options.url.clone(),
                reason: format!("Failed to read response body: {}", e),
            })?;

        debug!("Received {} bytes from {}", text.len(), options.url);
        Ok(WirePayload::Text(text))
    }

    fn abort(&self, _request: &Request) {
        // Dropping the exchange future cancels the reqwest call
        debug!("Abandoning in-flight HTTP exchange");
    }
}
