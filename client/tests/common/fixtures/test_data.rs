//! Common test data and helpers

use serde_json::{json, Value};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route library logs to the test output; honors RUST_LOG
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("jolokia_client=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub mod mbeans {
    pub const MEMORY: &str = "java.lang:type=Memory";
    pub const RUNTIME: &str = "java.lang:type=Runtime";
    pub const THREADING: &str = "java.lang:type=Threading";
}

/// Wire body of a successful read
pub fn heap_usage_payload() -> Value {
    json!({
        "status": 200,
        "timestamp": 1_700_000_000,
        "request": {
            "type": "read",
            "mbean": mbeans::MEMORY,
            "attribute": "HeapMemoryUsage"
        },
        "value": {
            "init": 268435456,
            "committed": 257425408,
            "max": 4294967296i64,
            "used": 40123456
        }
    })
}

pub fn error_payload(status: i64, error: &str) -> Value {
    json!({
        "status": status,
        "error": error,
        "stacktrace": "javax.management.InstanceNotFoundException\n\tat ..."
    })
}
