use config::ConfigError;
use lab_shared::host_config::{HostConfig, TOKEN_KEY};
use std::path::{Path, PathBuf};

use super::{ConfigFile, LAB_CONFIG_PATH, TOKEN_ENV};

/// Loaded configuration plus environment overrides.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub file: ConfigFile,
    /// Token from the environment, applied to every host
    pub token_override: Option<String>,
}

impl AppConfig {
    /// Load from `custom_config_path` or the default location, then apply
    /// environment overrides.
    pub fn load<P: AsRef<Path>>(custom_config_path: Option<P>) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(custom_config_path);
        let file = ConfigFile::load(&config_path)?;
        let token_override = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());

        Ok(AppConfig {
            config_path,
            file,
            token_override,
        })
    }

    /// Get the config file path, using custom path or default.
    pub fn get_config_path<P: AsRef<Path>>(path: Option<P>) -> PathBuf {
        match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::home_dir()
                .unwrap_or_default()
                .join(LAB_CONFIG_PATH),
        }
    }

    pub fn save(&self) -> Result<(), String> {
        self.file.save(&self.config_path)
    }
}

impl HostConfig for AppConfig {
    fn get(&self, host: &str, key: &str) -> Option<String> {
        if key == TOKEN_KEY
            && let Some(token) = &self.token_override
        {
            return Some(token.clone());
        }
        self.file.get(host, key)
    }
}
