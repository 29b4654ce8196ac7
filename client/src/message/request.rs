// File: client/src/message/request.rs
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::{FieldStore, Message, WirePayload};
use crate::config::ConnectionOptions;
use crate::dispatch::{DispatchHandle, Dispatcher};
use crate::errors::ClientError;
use crate::http::TransportBackend;
use crate::message::Response;

/// An outbound protocol request.
///
/// Besides the protocol fields, a request carries per-instance connection
/// options and optionally its own transport backend. Neither is part of the
/// wire encoding, and both survive [`Message::from_wire`].
#[derive(Clone, Default)]
pub struct Request {
    fields: FieldStore,
    connection: ConnectionOptions,
    backend: Option<Arc<dyn TransportBackend>>,
}

protocol_fields! {
    Request {
        /// Request type, e.g. `read`, `write`, `exec`, `list`, `version`
        scalar "type" => request_type, set_request_type;
        /// Target MBean name
        scalar "mbean" => mbean, set_mbean;
        scalar "attribute" => attribute, set_attribute;
        /// Inner path into the attribute value
        scalar "path" => path, set_path;
        scalar "value" => value, set_value;
        /// Operation arguments
        compound "arguments" => arguments, set_arguments, merge_arguments, set_argument;
        scalar "operation" => operation, set_operation;
    }
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request of the given type with no other fields set
    pub fn of_type(request_type: &str) -> Self {
        let mut request = Self::new();
        request
            .fields
            .insert_value("type", Value::String(request_type.to_string()));
        request
    }

    /// `read` request for an attribute (or all attributes) of an MBean
    pub fn read(mbean: &str, attribute: Option<&str>) -> Self {
        let mut request = Self::of_type("read");
        request.fields.insert_value("mbean", Value::String(mbean.to_string()));
        if let Some(attribute) = attribute {
            request
                .fields
                .insert_value("attribute", Value::String(attribute.to_string()));
        }
        request
    }

    /// `exec` request invoking an MBean operation
    pub fn exec(mbean: &str, operation: &str, arguments: Vec<Value>) -> Self {
        let mut request = Self::of_type("exec");
        request.fields.insert_value("mbean", Value::String(mbean.to_string()));
        request
            .fields
            .insert_value("operation", Value::String(operation.to_string()));
        request.fields.insert_value("arguments", Value::Array(arguments));
        request
    }

    /// Build a request from wire data
    pub fn from_wire_payload<P: Into<WirePayload>>(payload: P) -> Result<Self, ClientError> {
        let mut request = Self::new();
        request.from_wire(payload)?;
        Ok(request)
    }

    // === Connection options ===

    pub fn connection_options(&self) -> &ConnectionOptions {
        &self.connection
    }

    pub fn connection_options_mut(&mut self) -> &mut ConnectionOptions {
        &mut self.connection
    }

    /// Replace the per-instance connection options wholesale
    pub fn set_connection_options(&mut self, options: ConnectionOptions) -> &mut Self {
        self.connection = options;
        self
    }

    /// Overwrite only the options that are set in `options`
    pub fn merge_connection_options(&mut self, options: &ConnectionOptions) -> &mut Self {
        self.connection.merge_from(options);
        self
    }

    // === Transport backend ===

    pub fn backend(&self) -> Option<&Arc<dyn TransportBackend>> {
        self.backend.as_ref()
    }

    pub fn set_backend(&mut self, backend: Arc<dyn TransportBackend>) -> &mut Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn TransportBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    // === Dispatch ===

    /// Send this request through the shared dispatcher.
    ///
    /// Returns as soon as the cycle is started; the outcome is reported to the
    /// `on_success`/`on_error` hooks. Options given here take precedence over
    /// the request's own connection options and the library defaults.
    pub fn post(&self, options: Option<ConnectionOptions>) -> Result<DispatchHandle, ClientError> {
        Dispatcher::shared().dispatch(self, options)
    }

    /// Send this request and wait for the materialized response
    pub async fn send(&self, options: Option<ConnectionOptions>) -> Result<Response, ClientError> {
        Dispatcher::shared().send(self, options).await
    }
}

impl Message for Request {
    fn field_specs() -> &'static [super::FieldSpec] {
        Self::FIELDS
    }

    fn fields(&self) -> &FieldStore {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut FieldStore {
        &mut self.fields
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("fields", &self.fields)
            .field("connection", &self.connection)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish()
    }
}
