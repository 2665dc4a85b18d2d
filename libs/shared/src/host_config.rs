//! Per-host configuration lookup.

use std::collections::HashMap;

pub const TOKEN_KEY: &str = "token";
pub const SKIP_TLS_VERIFY_KEY: &str = "skip_tls_verify";
pub const CA_CERT_KEY: &str = "ca_cert";
pub const API_PROTOCOL_KEY: &str = "api_protocol";

/// Read access to settings stored per host.
pub trait HostConfig {
    fn get(&self, host: &str, key: &str) -> Option<String>;
}

/// `"true"` and `"1"` are truthy; everything else is not.
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1"))
}

/// In-memory [`HostConfig`].
#[derive(Debug, Clone, Default)]
pub struct MemoryHostConfig {
    hosts: HashMap<String, HashMap<String, String>>,
}

impl MemoryHostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, host: &str, key: &str, value: impl Into<String>) {
        self.hosts
            .entry(host.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn with(mut self, host: &str, key: &str, value: impl Into<String>) -> Self {
        self.set(host, key, value);
        self
    }
}

impl HostConfig for MemoryHostConfig {
    fn get(&self, host: &str, key: &str) -> Option<String> {
        self.hosts.get(host)?.get(key).cloned()
    }
}
