//! Test configuration builder for writing client configs to disk

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for a `client.toml` in a temporary directory
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    url: Option<String>,
    timeout_ms: Option<u64>,
    method: Option<String>,
    login: Option<(String, String)>,
    asynchronous: Option<bool>,
    wire_indent: Option<String>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            url: None,
            timeout_ms: None,
            method: None,
            login: None,
            asynchronous: None,
            wire_indent: None,
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    pub fn login(mut self, name: &str, password: &str) -> Self {
        self.login = Some((name.to_string(), password.to_string()));
        self
    }

    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = Some(asynchronous);
        self
    }

    pub fn wire_indent(mut self, indent: &str) -> Self {
        self.wire_indent = Some(indent.to_string());
        self
    }

    pub fn to_toml(&self) -> String {
        let mut toml = String::new();
        if let Some(url) = &self.url {
            toml.push_str(&format!("url = \"{}\"\n", url));
        }
        if let Some(timeout_ms) = self.timeout_ms {
            toml.push_str(&format!("timeout_ms = {}\n", timeout_ms));
        }
        if let Some(method) = &self.method {
            toml.push_str(&format!("method = \"{}\"\n", method));
        }
        if let Some((name, password)) = &self.login {
            toml.push_str(&format!("login_name = \"{}\"\n", name));
            toml.push_str(&format!("login_password = \"{}\"\n", password));
        }
        if let Some(asynchronous) = self.asynchronous {
            toml.push_str(&format!("asynchronous = {}\n", asynchronous));
        }
        if let Some(indent) = &self.wire_indent {
            toml.push_str(&format!("wire_indent = \"{}\"\n", indent));
        }
        toml
    }

    /// Write the config file and keep the temp dir alive with it
    pub fn build(self) -> TestConfig {
        let path = self.temp_dir.path().join("client.toml");
        fs::write(&path, self.to_toml()).expect("Failed to write client.toml");
        TestConfig {
            _temp_dir: self.temp_dir,
            path,
        }
    }
}

pub struct TestConfig {
    _temp_dir: TempDir,
    pub path: PathBuf,
}
