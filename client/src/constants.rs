//! Library-wide constants for connection defaults and wire formatting

use std::time::Duration;

/// Connection defaults used when neither the call nor the request sets a value
pub mod defaults {
    use super::Duration;

    /// Agent endpoint, relative to the serving origin
    pub const URL: &str = "/jolokia/";

    /// Default dispatch timeout in milliseconds
    pub const TIMEOUT_MS: u64 = 15_000;

    /// Default dispatch timeout
    pub const TIMEOUT: Duration = Duration::from_millis(TIMEOUT_MS);

    /// Requests are dispatched asynchronously unless a backend says otherwise
    pub const ASYNCHRONOUS: bool = true;

    /// Indentation used when pretty-printing wire messages
    pub const WIRE_INDENT: &str = "  ";
}

/// HTTP backend constants
pub mod http {
    use super::Duration;

    /// Content type sent with POSTed requests
    pub const CONTENT_TYPE: &str = "text/plain";

    /// Timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Protocol constants
pub mod protocol {
    /// Status value the agent uses for a successful request
    pub const SUCCESS_STATUS: i64 = 200;
}
