//! Connection options and their resolution
//!
//! Three layers feed one dispatch cycle, in precedence order:
//!
//! ```text
//! per-call options  >  request's connection options  >  ClientConfig defaults
//! ```
//!
//! Hooks are shared between layers by reference (`Arc`); JSON values in
//! `extra` are cloned, so no two cycles share mutable option state.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{ClientConfig, Method};
use crate::errors::{ConfigError, DispatchError};
use crate::message::{Request, Response};

/// Runs before a request is handed to a backend; `Ok(Some(response))` short-circuits the exchange
pub type BeforeDispatch =
    Arc<dyn Fn(&Request, &EffectiveOptions) -> anyhow::Result<Option<Response>> + Send + Sync>;

/// Runs once the exchange is over, before `on_success`/`on_error`
pub type AfterDispatch = Arc<dyn Fn(&Request, &EffectiveOptions) -> anyhow::Result<()> + Send + Sync>;

/// Receives a response with status 200 and the originating request
pub type OnSuccess = Arc<dyn Fn(&Response, &Request) + Send + Sync>;

/// Receives the request and the options; `options.failure()` describes what went wrong
pub type OnError = Arc<dyn Fn(&Request, &EffectiveOptions) -> anyhow::Result<()> + Send + Sync>;

/// One layer of connection options. Unset fields fall through to lower layers.
#[derive(Clone, Default)]
pub struct ConnectionOptions {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub timeout: Option<Duration>,
    pub login_name: Option<String>,
    pub login_password: Option<String>,
    pub asynchronous: Option<bool>,
    /// Backend-specific options, merged per key
    pub extra: Map<String, Value>,
    pub before_dispatch: Option<BeforeDispatch>,
    pub after_dispatch: Option<AfterDispatch>,
    pub on_success: Option<OnSuccess>,
    pub on_error: Option<OnError>,
}

macro_rules! overwrite_if_set {
    ($target:ident, $source:ident; $($field:ident),*) => {
        $( if $source.$field.is_some() { $target.$field = $source.$field.clone(); } )*
    };
}

macro_rules! fill_if_unset {
    ($target:ident, $source:ident; $($field:ident),*) => {
        $( if $target.$field.is_none() { $target.$field = $source.$field.clone(); } )*
    };
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_credentials(mut self, name: impl Into<String>, password: Option<&str>) -> Self {
        self.login_name = Some(name.into());
        self.login_password = password.map(str::to_string);
        self
    }

    pub fn with_asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = Some(asynchronous);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
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

    /// Layer `other` on top of `self`: every option set in `other` wins
    pub fn merge_from(&mut self, other: &ConnectionOptions) {
        overwrite_if_set!(self, other; url, method, timeout, login_name, login_password, asynchronous,
            before_dispatch, after_dispatch, on_success, on_error);
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Copy in every option that is unset here but set in `defaults`
    pub fn fill_missing_from(&mut self, defaults: &ConnectionOptions) {
        fill_if_unset!(self, defaults; url, method, timeout, login_name, login_password, asynchronous,
            before_dispatch, after_dispatch, on_success, on_error);
        for (key, value) in &defaults.extra {
            if !self.extra.contains_key(key) {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("timeout", &self.timeout)
            .field("login_name", &self.login_name)
            .field("login_password", &self.login_password.as_ref().map(|_| "***"))
            .field("asynchronous", &self.asynchronous)
            .field("extra", &self.extra)
            .field("before_dispatch", &self.before_dispatch.is_some())
            .field("after_dispatch", &self.after_dispatch.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Fully-resolved options for a single dispatch cycle
#[derive(Clone)]
pub struct EffectiveOptions {
    pub url: String,
    pub method: Method,
    pub timeout: Duration,
    pub login_name: Option<String>,
    pub login_password: Option<String>,
    pub asynchronous: bool,
    pub extra: Map<String, Value>,
    pub before_dispatch: Option<BeforeDispatch>,
    pub after_dispatch: Option<AfterDispatch>,
    pub on_success: Option<OnSuccess>,
    pub on_error: Option<OnError>,
    failure: Option<DispatchError>,
}

impl EffectiveOptions {
    /// Why the cycle failed; set by the dispatcher before `on_error` runs
    pub fn failure(&self) -> Option<&DispatchError> {
        self.failure.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().map(|e| e.to_string())
    }

    pub(crate) fn set_failure(&mut self, failure: DispatchError) {
        self.failure = Some(failure);
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Transport-level credentials, present only when a login name is configured
    pub fn credentials(&self) -> Option<(&str, Option<&str>)> {
        self.login_name
            .as_deref()
            .map(|name| (name, self.login_password.as_deref()))
    }
}

impl TryFrom<ConnectionOptions> for EffectiveOptions {
    type Error = ConfigError;

    fn try_from(options: ConnectionOptions) -> Result<Self, Self::Error> {
        let missing = |option: &str| ConfigError::MissingOption {
            option: option.to_string(),
        };
        Ok(Self {
            url: options.url.ok_or_else(|| missing("url"))?,
            method: options.method.ok_or_else(|| missing("method"))?,
            timeout: options.timeout.ok_or_else(|| missing("timeout"))?,
            login_name: options.login_name,
            login_password: options.login_password,
            asynchronous: options.asynchronous.unwrap_or(crate::constants::defaults::ASYNCHRONOUS),
            extra: options.extra,
            before_dispatch: options.before_dispatch,
            after_dispatch: options.after_dispatch,
            on_success: options.on_success,
            on_error: options.on_error,
            failure: None,
        })
    }
}

impl fmt::Debug for EffectiveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("timeout", &self.timeout)
            .field("login_name", &self.login_name)
            .field("asynchronous", &self.asynchronous)
            .field("extra", &self.extra)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("failure", &self.failure)
            .finish()
    }
}

/// Merges per-call options, a request's own options and the library defaults
pub struct OptionsResolver<'a> {
    defaults: &'a ClientConfig,
}

impl<'a> OptionsResolver<'a> {
    pub fn new(defaults: &'a ClientConfig) -> Self {
        Self { defaults }
    }

    /// Resolve the effective options for dispatching `request`
    pub fn resolve(
        &self,
        request: &Request,
        explicit: Option<&ConnectionOptions>,
    ) -> Result<EffectiveOptions, ConfigError> {
        let mut resolved = explicit.cloned().unwrap_or_default();

        let mut combined = self.defaults.as_layer();
        combined.merge_from(request.connection_options());

        resolved.fill_missing_from(&combined);
        EffectiveOptions::try_from(resolved)
    }
}
