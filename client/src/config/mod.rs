// File: client/src/config/mod.rs
pub mod options;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error};

use crate::constants::defaults;
use crate::errors::ConfigError;
use crate::message::{Request, Response};

pub use options::{
    AfterDispatch, BeforeDispatch, ConnectionOptions, EffectiveOptions, OnError, OnSuccess,
    OptionsResolver,
};

/// HTTP-like method used to reach the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
    Get,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Post => write!(f, "POST"),
            Method::Get => write!(f, "GET"),
        }
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(Method::Post),
            "GET" => Ok(Method::Get),
            _ => Err(ConfigError::InvalidValue {
                field: "method".to_string(),
                reason: format!("unknown method '{}'", s),
            }),
        }
    }
}

/// Library-wide connection defaults.
///
/// This is the bottom layer of option resolution. It is immutable once handed
/// to a [`Dispatcher`](crate::Dispatcher); build a new one to change defaults.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub method: Method,
    pub login_name: Option<String>,
    pub login_password: Option<String>,
    pub asynchronous: bool,
    /// Indentation for pretty-printed wire messages; `None` disables pretty printing
    pub wire_indent: Option<String>,
    #[serde(skip)]
    pub before_dispatch: Option<BeforeDispatch>,
    #[serde(skip)]
    pub after_dispatch: Option<AfterDispatch>,
    #[serde(skip, default = "default_on_success")]
    pub on_success: Option<OnSuccess>,
    #[serde(skip, default = "default_on_error")]
    pub on_error: Option<OnError>,
}

fn default_on_success() -> Option<OnSuccess> {
    Some(Arc::new(ignore_response))
}

/// Default `on_success` hook. Its presence makes every cycle classify the
/// response status, so a non-200 reply still reaches `on_error`.
pub fn ignore_response(_response: &Response, _request: &Request) {}

fn default_on_error() -> Option<OnError> {
    Some(Arc::new(log_dispatch_error))
}

/// Default `on_error` hook: report the failure through tracing
pub fn log_dispatch_error(request: &Request, options: &EffectiveOptions) -> anyhow::Result<()> {
    error!(
        url = %options.url,
        request_type = ?request.request_type(),
        "Request dispatch failed: {}",
        options.error_message().unwrap_or_else(|| "unknown error".to_string())
    );
    Ok(())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: defaults::URL.to_string(),
            timeout_ms: defaults::TIMEOUT_MS,
            method: Method::Post,
            login_name: None,
            login_password: None,
            asynchronous: defaults::ASYNCHRONOUS,
            wire_indent: Some(defaults::WIRE_INDENT.to_string()),
            before_dispatch: None,
            after_dispatch: None,
            on_success: default_on_success(),
            on_error: default_on_error(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!("Loading client config: {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_before_dispatch<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &EffectiveOptions) -> anyhow::Result<Option<Response>> + Send + Sync + 'static,
    {
        self.before_dispatch = Some(Arc::new(hook));
        self
    }

    pub fn with_after_dispatch<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &EffectiveOptions) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after_dispatch = Some(Arc::new(hook));
        self
    }

    pub fn with_on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Response, &Request) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn with_on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &EffectiveOptions) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// The defaults as a fully-populated option layer
    pub fn as_layer(&self) -> ConnectionOptions {
        ConnectionOptions {
            url: Some(self.url.clone()),
            method: Some(self.method),
            timeout: Some(self.timeout()),
            login_name: self.login_name.clone(),
            login_password: self.login_password.clone(),
            asynchronous: Some(self.asynchronous),
            extra: Default::default(),
            before_dispatch: self.before_dispatch.clone(),
            after_dispatch: self.after_dispatch.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("timeout_ms", &self.timeout_ms)
            .field("method", &self.method)
            .field("login_name", &self.login_name)
            .field("login_password", &self.login_password.as_ref().map(|_| "***"))
            .field("asynchronous", &self.asynchronous)
            .field("wire_indent", &self.wire_indent)
            .field("before_dispatch", &self.before_dispatch.is_some())
            .field("after_dispatch", &self.after_dispatch.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
