// File: client/src/http/mod.rs
//! Transport backends
//!
//! The dispatcher never performs network I/O itself. It hands the request and
//! its effective options to a [`TransportBackend`], which reports back exactly
//! once by returning from [`exchange`](TransportBackend::exchange).
//!
//! # Flow
//!
//! ```text
//! Dispatcher → exchange(request, options) → Agent
//!     ↓                                        ↓
//!   timer ──(expires first)──→ abort()    raw payload
//!     ↓                                        ↓
//! on_error ←──────── failure ─────── success → on_success
//! ```
//!
//! A backend must:
//!
//! - encode the request with [`Message::to_wire_string`](crate::Message::to_wire_string)
//! - honor `login_name`/`login_password` as transport credentials when present
//! - return the raw payload on success, or a [`TransportError`]
//! - tolerate being abandoned mid-flight when the dispatch timer fires

pub mod backend;

use async_trait::async_trait;

use crate::config::{EffectiveOptions, Method};
use crate::errors::TransportError;
use crate::message::{Request, WirePayload};

pub use backend::HttpBackend;

#[async_trait]
pub trait TransportBackend: Send + Sync {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &str;

    /// Whether this backend can dispatch with `method`. Only POST is required.
    fn supports_method(&self, method: Method) -> bool {
        method == Method::Post
    }

    /// Perform one exchange with the agent
    async fn exchange(
        &self,
        request: &Request,
        options: &EffectiveOptions,
    ) -> Result<WirePayload, TransportError>;

    /// Best-effort cancellation, called when the dispatch timer wins the race.
    ///
    /// The in-flight `exchange` future is dropped right after this returns.
    fn abort(&self, _request: &Request) {}
}
