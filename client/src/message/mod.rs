// File: client/src/message/mod.rs
//! Protocol message model
//!
//! Requests and responses are thin wrappers around a [`FieldStore`]. Each
//! message type declares its protocol fields once, in a descriptor table fed
//! to `protocol_fields!`, which generates the typed accessors:
//!
//! ```text
//! Request  { type, mbean, attribute, path, value, arguments*, operation }
//! Response { value, timestamp, status, error, history, stacktrace } + request
//!                                                 (* compound field)
//! ```
//!
//! Readers return `Option<&Value>`; writers deep-copy their argument and
//! return `&mut Self` so calls can be chained with `?`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{ClientError, DecodeError, FieldError};

/// Generates the field-descriptor table and accessors for a message type.
///
/// Each line is `scalar "wire" => getter, setter;` or
/// `compound "wire" => getter, setter, merger, entry_setter;`.
macro_rules! protocol_fields {
    (
        $owner:ident {
            $( $(#[$doc:meta])* $kind:ident $wire:literal => $get:ident, $set:ident $(, $merge:ident, $entry:ident)? ; )*
        }
    ) => {
        impl $owner {
            /// Protocol fields carried by this message type, in wire order
            pub const FIELDS: &'static [$crate::message::FieldSpec] = &[
                $( $crate::message::FieldSpec { name: $wire, compound: protocol_fields!(@compound $kind) }, )*
            ];

            $( protocol_fields!(@accessors $kind $wire, [$(#[$doc])*] $get, $set $(, $merge, $entry)?); )*
        }
    };

    (@compound scalar) => { false };
    (@compound compound) => { true };

    (@accessors scalar $wire:literal, [$(#[$doc:meta])*] $get:ident, $set:ident) => {
        $(#[$doc])*
        pub fn $get(&self) -> Option<&serde_json::Value> {
            self.fields.get($wire)
        }

        #[doc = concat!("Sets the `", $wire, "` field to a deep copy of `value`.")]
        pub fn $set<T: serde::Serialize + ?Sized>(
            &mut self,
            value: &T,
        ) -> Result<&mut Self, $crate::errors::FieldError> {
            self.fields.set($wire, value)?;
            Ok(self)
        }
    };

    (@accessors compound $wire:literal, [$(#[$doc:meta])*] $get:ident, $set:ident, $merge:ident, $entry:ident) => {
        protocol_fields!(@accessors scalar $wire, [$(#[$doc])*] $get, $set);

        #[doc = concat!("Shallow-merges the properties of `patch` into the `", $wire, "` field.")]
        pub fn $merge<T: serde::Serialize + ?Sized>(
            &mut self,
            patch: &T,
        ) -> Result<&mut Self, $crate::errors::FieldError> {
            self.fields.merge_compound($wire, patch)?;
            Ok(self)
        }

        #[doc = concat!("Sets one property (or index) of the `", $wire, "` field.")]
        pub fn $entry<T: serde::Serialize + ?Sized>(
            &mut self,
            entry: &str,
            value: &T,
        ) -> Result<&mut Self, $crate::errors::FieldError> {
            self.fields.set_compound_entry($wire, entry, value)?;
            Ok(self)
        }
    };
}

pub mod fields;
pub mod request;
pub mod response;

pub use fields::{FieldSpec, FieldStore};
pub use request::Request;
pub use response::Response;

/// A wire payload, either still encoded or already decoded
#[derive(Debug, Clone, PartialEq)]
pub enum WirePayload {
    Text(String),
    Json(Value),
}

impl WirePayload {
    /// True for payloads that carry no data at all
    pub fn is_empty(&self) -> bool {
        match self {
            WirePayload::Text(text) => text.trim().is_empty(),
            WirePayload::Json(value) => value.is_null(),
        }
    }

    /// Decode into a JSON object
    pub fn into_object(self) -> Result<Map<String, Value>, DecodeError> {
        let value = match self {
            WirePayload::Text(text) => serde_json::from_str(&text)?,
            WirePayload::Json(value) => value,
        };
        match value {
            Value::Object(map) => Ok(map),
            other => Err(DecodeError::NotAnObject {
                found: describe(&other).to_string(),
            }),
        }
    }

    /// Render the payload for diagnostics
    pub fn to_display_string(&self) -> String {
        match self {
            WirePayload::Text(text) => text.clone(),
            WirePayload::Json(value) => value.to_string(),
        }
    }
}

impl From<String> for WirePayload {
    fn from(text: String) -> Self {
        WirePayload::Text(text)
    }
}

impl From<&str> for WirePayload {
    fn from(text: &str) -> Self {
        WirePayload::Text(text.to_string())
    }
}

impl From<Value> for WirePayload {
    fn from(value: Value) -> Self {
        WirePayload::Json(value)
    }
}

impl From<Map<String, Value>> for WirePayload {
    fn from(map: Map<String, Value>) -> Self {
        WirePayload::Json(Value::Object(map))
    }
}

/// Shared behaviour of requests and responses
pub trait Message: Sized {
    /// Field descriptor table for this message type
    fn field_specs() -> &'static [FieldSpec];

    fn fields(&self) -> &FieldStore;

    fn fields_mut(&mut self) -> &mut FieldStore;

    /// Repopulate protocol fields from a decoded wire object.
    ///
    /// Called by [`from_wire`](Message::from_wire) after all fields were reset.
    /// An override must fail before touching any state outside the field store.
    /// The default copies every declared field that is present in `wire`.
    fn populate(&mut self, mut wire: Map<String, Value>) -> Result<(), ClientError> {
        absorb_fields(Self::field_specs(), self.fields_mut(), &mut wire);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.fields().get(key)
    }

    fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<&mut Self, FieldError> {
        self.fields_mut().set(key, value)?;
        Ok(self)
    }

    fn set_batch<T: Serialize + ?Sized>(&mut self, batch: &T) -> Result<&mut Self, FieldError> {
        self.fields_mut().set_batch(batch)?;
        Ok(self)
    }

    /// Snapshot of all protocol fields that are currently set
    fn to_wire_object(&self) -> Value {
        Value::Object(snapshot_fields(Self::field_specs(), self.fields()))
    }

    /// Canonical JSON encoding, pretty-printed when `indent` is given
    fn to_wire_string(&self, indent: Option<&str>) -> Result<String, DecodeError> {
        encode(&self.to_wire_object(), indent)
    }

    /// Reset all protocol fields and repopulate them from `payload`.
    ///
    /// On error the message is left as it was.
    fn from_wire<P: Into<WirePayload>>(&mut self, payload: P) -> Result<&mut Self, ClientError> {
        let wire = payload.into().into_object()?;
        let previous = std::mem::take(self.fields_mut());
        if let Err(e) = self.populate(wire) {
            *self.fields_mut() = previous;
            return Err(e);
        }
        Ok(self)
    }
}

/// Copy every declared field that is present in `store`
pub(crate) fn snapshot_fields(specs: &[FieldSpec], store: &FieldStore) -> Map<String, Value> {
    let mut wire = Map::new();
    for spec in specs {
        if let Some(value) = store.get(spec.name) {
            wire.insert(spec.name.to_string(), value.clone());
        }
    }
    wire
}

/// Move every declared field out of `wire` into `store`; absent fields stay absent
pub(crate) fn absorb_fields(specs: &[FieldSpec], store: &mut FieldStore, wire: &mut Map<String, Value>) {
    for spec in specs {
        if let Some(value) = wire.remove(spec.name) {
            store.insert_value(spec.name, value);
        }
    }
}

pub(crate) fn encode(value: &Value, indent: Option<&str>) -> Result<String, DecodeError> {
    let encode_err = |e: serde_json::Error| DecodeError::Encode {
        reason: e.to_string(),
    };
    match indent {
        None => serde_json::to_string(value).map_err(encode_err),
        Some(indent) => {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut serializer).map_err(encode_err)?;
            String::from_utf8(buf).map_err(|e| DecodeError::Encode {
                reason: e.to_string(),
            })
        }
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
