// File: client/src/message/response.rs
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{absorb_fields, snapshot_fields, FieldStore, Message, Request, WirePayload};
use crate::constants::protocol::SUCCESS_STATUS;
use crate::errors::ClientError;

/// An inbound protocol response, optionally linked to the request that produced it
#[derive(Debug, Clone, Default)]
pub struct Response {
    fields: FieldStore,
    request: Option<Box<Request>>,
}

protocol_fields! {
    Response {
        /// Result value returned by the agent
        scalar "value" => value, set_value;
        /// Agent time of the response, in seconds since the epoch
        scalar "timestamp" => timestamp, set_timestamp;
        /// Protocol status; `200` means success
        scalar "status" => status, set_status;
        scalar "error" => error, set_error;
        scalar "history" => history, set_history;
        scalar "stacktrace" => stacktrace, set_stacktrace;
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a response from wire data
    pub fn from_wire_payload<P: Into<WirePayload>>(payload: P) -> Result<Self, ClientError> {
        let mut response = Self::new();
        response.from_wire(payload)?;
        Ok(response)
    }

    /// Request that produced this response, if linked
    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }

    /// Link the originating request
    pub fn set_request(&mut self, request: Request) -> &mut Self {
        self.request = Some(Box::new(request));
        self
    }

    /// Link a request reconstructed from wire data; null unlinks
    pub fn set_request_from_wire<P: Into<WirePayload>>(
        &mut self,
        payload: P,
    ) -> Result<&mut Self, ClientError> {
        let payload = payload.into();
        self.request = if payload.is_empty() {
            None
        } else {
            Some(Box::new(Request::from_wire_payload(payload)?))
        };
        Ok(self)
    }

    /// Status as an integer, accepting numeric strings and integral floats
    pub fn status_code(&self) -> Option<i64> {
        match self.status()? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code() == Some(SUCCESS_STATUS)
    }

    /// Error text reported by the agent
    pub fn error_text(&self) -> Option<String> {
        match self.error()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let secs = self.timestamp()?.as_i64()?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl Message for Response {
    fn field_specs() -> &'static [super::FieldSpec] {
        Self::FIELDS
    }

    fn fields(&self) -> &FieldStore {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut FieldStore {
        &mut self.fields
    }

    fn populate(&mut self, mut wire: Map<String, Value>) -> Result<(), ClientError> {
        // Decode the nested request before anything is overwritten
        let request = match wire.remove("request").map(WirePayload::from) {
            Some(payload) if !payload.is_empty() => Some(Box::new(Request::from_wire_payload(payload)?)),
            _ => None,
        };
        absorb_fields(Self::FIELDS, &mut self.fields, &mut wire);
        self.request = request;
        Ok(())
    }

    fn to_wire_object(&self) -> Value {
        let mut wire = snapshot_fields(Self::FIELDS, &self.fields);
        if let Some(request) = &self.request {
            wire.insert("request".to_string(), request.to_wire_object());
        }
        Value::Object(wire)
    }
}
