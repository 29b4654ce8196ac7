//! Custom error types for the protocol client
//!
//! Synchronous API calls return [`ClientError`]. Failures discovered while a
//! request is in flight are never returned to the caller; they are described
//! by a [`DispatchError`] and handed to the `on_error` hook.

use std::fmt;

/// Main error type for synchronous client calls
#[derive(Debug)]
pub enum ClientError {
    /// Option resolution or dispatch misuse
    Config(ConfigError),

    /// A field could not be stored on a message
    Field(FieldError),

    /// A wire payload could not be decoded
    Decode(DecodeError),

    /// The `before_dispatch` hook refused the request
    Hook(anyhow::Error),

    /// The exchange itself failed (only produced by awaiting forms such as `Request::send`)
    Dispatch(DispatchError),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// A required connection option has no value in any layer
    MissingOption { option: String },

    /// The selected backend cannot dispatch with this method
    UnsupportedMethod { method: String, backend: String },

    /// Dispatch was attempted outside of a tokio runtime
    NoRuntime,

    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },
}

/// Field store error variants
#[derive(Debug)]
pub enum FieldError {
    /// The value could not be copied through the wire model
    NotSerializable { key: String, reason: String },

    /// A batch write was given something other than an object or array
    NotABatch { found: String },

    /// A compound accessor was used on a scalar field value
    NotCompound { key: String, found: String },
}

/// Wire decoding error variants
#[derive(Debug)]
pub enum DecodeError {
    /// Payload is not valid JSON
    Malformed { reason: String },

    /// Payload decoded, but is not a JSON object
    NotAnObject { found: String },

    /// Output could not be encoded
    Encode { reason: String },
}

/// Transport-level failures reported by a backend
#[derive(Debug, Clone)]
pub enum TransportError {
    /// Connection to the agent could not be established or completed
    ConnectionFailed { url: String, reason: String },

    /// Agent answered with a non-success HTTP status
    Status {
        method: String,
        url: String,
        status: u16,
        status_text: String,
    },

    /// Request body could not be produced
    Encode { reason: String },

    /// Any other backend-specific failure
    Other(String),
}

/// Diagnostics delivered to `on_error` for a failed dispatch cycle
#[derive(Debug, Clone)]
pub enum DispatchError {
    /// Backend could not complete the exchange
    Transport(TransportError),

    /// Timer fired before the backend reported
    Timeout { timeout_ms: u64, elapsed_ms: u64 },

    /// Backend succeeded but delivered nothing
    EmptyPayload,

    /// Payload arrived but could not be turned into a response
    InvalidResponse { reason: String, payload: String },

    /// Agent answered with a protocol-level error status
    ErrorStatus {
        status: Option<i64>,
        error: Option<String>,
        response: Box<crate::message::Response>,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Config(e) => write!(f, "Configuration error: {}", e),
            ClientError::Field(e) => write!(f, "Field error: {}", e),
            ClientError::Decode(e) => write!(f, "Decode error: {}", e),
            ClientError::Hook(e) => write!(f, "before_dispatch hook failed: {}", e),
            ClientError::Dispatch(e) => write!(f, "Dispatch failed: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingOption { option } => {
                write!(f, "No value for connection option '{}' in any layer", option)
            }
            ConfigError::UnsupportedMethod { method, backend } => {
                write!(
                    f,
                    "Only POST requests are currently implemented ({} backend got {})",
                    backend, method
                )
            }
            ConfigError::NoRuntime => {
                write!(f, "Dispatch requires a running tokio runtime")
            }
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::NotSerializable { key, reason } => {
                write!(f, "Cannot set field [{}]: {}", key, reason)
            }
            FieldError::NotABatch { found } => {
                write!(f, "Batch set expects an object or array, got {}", found)
            }
            FieldError::NotCompound { key, found } => {
                write!(f, "Field [{}] holds {}, not an object or array", key, found)
            }
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed { reason } => write!(f, "Malformed wire payload: {}", reason),
            DecodeError::NotAnObject { found } => {
                write!(f, "Wire payload must be a JSON object, got {}", found)
            }
            DecodeError::Encode { reason } => write!(f, "Failed to encode message: {}", reason),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectionFailed { url, reason } => {
                write!(f, "Connection to [{}] failed: {}", url, reason)
            }
            TransportError::Status {
                method,
                url,
                status,
                status_text,
            } => {
                write!(
                    f,
                    "Error sending a '{}' request to [{}]: Status text=[{} {}]",
                    method, url, status, status_text
                )
            }
            TransportError::Encode { reason } => write!(f, "Failed to encode request: {}", reason),
            TransportError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Transport(e) => write!(f, "{}", e),
            DispatchError::Timeout {
                timeout_ms,
                elapsed_ms,
            } => {
                write!(
                    f,
                    "Timeout of {}ms reached after {}ms during request",
                    timeout_ms, elapsed_ms
                )
            }
            DispatchError::EmptyPayload => {
                write!(f, "Request dispatch succeeded but returned no data")
            }
            DispatchError::InvalidResponse { reason, payload } => {
                write!(
                    f,
                    "Exception while handling inbound response: {}\nOriginal response data:\n{}",
                    reason, payload
                )
            }
            DispatchError::ErrorStatus { status, error, .. } => {
                let status = status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "<none>".to_string());
                match error {
                    Some(error) => write!(f, "Agent returned status {}: {}", status, error),
                    None => write!(f, "Agent returned status {}", status),
                }
            }
        }
    }
}

impl DispatchError {
    /// True when the failure came from the dispatch timer
    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout { .. })
    }
}

// Implement std::error::Error
impl std::error::Error for ClientError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for FieldError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for TransportError {}
impl std::error::Error for DispatchError {}

// Conversions from anyhow::Error for hooks
impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Hook(err)
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::Config(err)
    }
}

impl From<FieldError> for ClientError {
    fn from(err: FieldError) -> Self {
        ClientError::Field(err)
    }
}

impl From<DecodeError> for ClientError {
    fn from(err: DecodeError) -> Self {
        ClientError::Decode(err)
    }
}

impl From<DispatchError> for ClientError {
    fn from(err: DispatchError) -> Self {
        ClientError::Dispatch(err)
    }
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        DispatchError::Transport(err)
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Malformed {
            reason: err.to_string(),
        }
    }
}
