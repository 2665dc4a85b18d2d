//! Configuration file structure and operations.

use config::ConfigError;
use lab_shared::host_config::{API_PROTOCOL_KEY, CA_CERT_KEY, SKIP_TLS_VERIFY_KEY, TOKEN_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, write};
use std::io;
use std::path::Path;

/// `skip_tls_verify` may be written as a TOML boolean, integer or string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Flag {
    fn as_config_value(&self) -> String {
        match self {
            Flag::Bool(value) => value.to_string(),
            Flag::Int(value) => value.to_string(),
            Flag::Text(value) => value.clone(),
        }
    }
}

/// Settings for a single host.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct HostSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_tls_verify: Option<Flag>,
    /// Path to a PEM bundle trusted in addition to the system store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_protocol: Option<String>,
}

impl HostSettings {
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            TOKEN_KEY => self.token.clone(),
            SKIP_TLS_VERIFY_KEY => self.skip_tls_verify.as_ref().map(Flag::as_config_value),
            CA_CERT_KEY => self.ca_cert.clone(),
            API_PROTOCOL_KEY => self.api_protocol.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = Some(value.to_string()).filter(|v| !v.is_empty());
        match key {
            TOKEN_KEY => self.token = value,
            SKIP_TLS_VERIFY_KEY => self.skip_tls_verify = value.map(Flag::Text),
            CA_CERT_KEY => self.ca_cert = value,
            API_PROTOCOL_KEY => self.api_protocol = value,
            other => {
                return Err(ConfigError::Message(format!(
                    "Unknown host setting '{}'. Expected one of: {}, {}, {}, {}",
                    other, TOKEN_KEY, SKIP_TLS_VERIFY_KEY, CA_CERT_KEY, API_PROTOCOL_KEY
                )));
            }
        }
        Ok(())
    }
}

/// The complete configuration file structure.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ConfigFile {
    /// Per-host settings keyed by host name
    #[serde(default)]
    pub hosts: BTreeMap<String, HostSettings>,
}

impl ConfigFile {
    /// Load the file at `config_path`; a missing file is an empty config.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(config_path.as_ref()) {
            Ok(content) => toml::from_str::<ConfigFile>(&content).map_err(|e| {
                ConfigError::Message(format!(
                    "Failed to parse config file {}: {}",
                    config_path.as_ref().display(),
                    e
                ))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ConfigFile::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Failed to read config file: {}",
                e
            ))),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, config_path: P) -> Result<(), String> {
        if let Some(parent) = config_path.as_ref().parent() {
            create_dir_all(parent).map_err(|e| format!("{}", e))?;
        }
        let config_str = toml::to_string_pretty(self).map_err(|e| format!("{}", e))?;
        write(config_path, config_str).map_err(|e| format!("{}", e))
    }

    pub fn host(&self, host: &str) -> Option<&HostSettings> {
        self.hosts.get(host)
    }

    pub fn get(&self, host: &str, key: &str) -> Option<String> {
        self.host(host)?.get(key)
    }

    pub fn set(&mut self, host: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        if host.trim().is_empty() {
            return Err(ConfigError::Message("Host name cannot be empty".into()));
        }
        self.hosts.entry(host.to_string()).or_default().set(key, value)
    }
}
