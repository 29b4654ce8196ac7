//! This module provides reusable test utilities:
//! - Mock Jolokia agent (wiremock)
//! - Scripted in-process transport backend
//! - Hook call recorder
//! - Test configuration builders
//! - Common test data

// Not every test binary uses every fixture
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_agent;
pub mod recorder;
pub mod scripted_backend;
pub mod test_config;
pub mod test_data;

pub use mock_agent::MockAgentServer;
pub use recorder::CallbackRecorder;
pub use scripted_backend::ScriptedBackend;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
