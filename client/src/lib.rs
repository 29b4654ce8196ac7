// File: client/src/lib.rs
//! Client library for the Jolokia JMX-over-HTTP management protocol.
//!
//! Requests and responses are field-addressed JSON messages. A request is
//! posted through a [`Dispatcher`], which layers connection options, hands the
//! request to a [`TransportBackend`] and routes the outcome to exactly one of
//! the `on_success` / `on_error` hooks.
//!
//! ```no_run
//! use jolokia_client::{ConnectionOptions, Request};
//!
//! # async fn demo() -> Result<(), jolokia_client::ClientError> {
//! let request = Request::read("java.lang:type=Memory", Some("HeapMemoryUsage"));
//! let options = ConnectionOptions::new().with_url("http://localhost:8778/jolokia/");
//! let response = request.send(Some(options)).await?;
//! println!("{:?}", response.value());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod message;

pub use config::{ClientConfig, ConnectionOptions, EffectiveOptions, Method, OptionsResolver};
pub use dispatch::{DispatchHandle, DispatchOutcome, DispatchState, Dispatcher, Inbound};
pub use errors::{ClientError, ConfigError, DecodeError, DispatchError, FieldError, TransportError};
pub use http::{HttpBackend, TransportBackend};
pub use message::{FieldSpec, FieldStore, Message, Request, Response, WirePayload};
