//! Tests for configuration module.

use super::*;
use lab_shared::host_config::{CA_CERT_KEY, HostConfig, SKIP_TLS_VERIFY_KEY, TOKEN_KEY, is_truthy};
use std::path::PathBuf;
use tempfile::TempDir;

const CONFIG: &str = r#"
[hosts."gitlab.com"]
token = "glpat-public"

[hosts."git.corp.internal"]
token = "glpat-corp"
ca_cert = "/etc/ssl/corp-root.pem"
api_protocol = "https"

[hosts."dev.local"]
skip_tls_verify = true
"#;

fn get_a_config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("config.toml")
}

fn app_config(file: ConfigFile, token_override: Option<&str>) -> AppConfig {
    AppConfig {
        config_path: PathBuf::from("/tmp/lab/config.toml"),
        file,
        token_override: token_override.map(str::to_string),
    }
}

#[test]
fn missing_file_loads_empty_config() {
    let dir = TempDir::new().unwrap();
    let config = ConfigFile::load(get_a_config_path(&dir)).unwrap();
    assert!(config.hosts.is_empty());
}

#[test]
fn parses_hosts_table() {
    let dir = TempDir::new().unwrap();
    let path = get_a_config_path(&dir);
    std::fs::write(&path, CONFIG).unwrap();

    let config = ConfigFile::load(&path).unwrap();
    assert_eq!(config.get("gitlab.com", TOKEN_KEY).as_deref(), Some("glpat-public"));
    assert_eq!(
        config.get("git.corp.internal", CA_CERT_KEY).as_deref(),
        Some("/etc/ssl/corp-root.pem")
    );
    assert_eq!(config.get("dev.local", SKIP_TLS_VERIFY_KEY).as_deref(), Some("true"));
    assert!(is_truthy(config.get("dev.local", SKIP_TLS_VERIFY_KEY).as_deref()));
    assert_eq!(config.get("unknown.host", TOKEN_KEY), None);
}

#[test]
fn invalid_toml_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = get_a_config_path(&dir);
    std::fs::write(&path, "[hosts\nbroken").unwrap();
    assert!(ConfigFile::load(&path).is_err());
}

#[test]
fn set_and_save_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = ConfigFile::default();
    config.set("example.com", TOKEN_KEY, "abc123").unwrap();
    config.set("example.com", SKIP_TLS_VERIFY_KEY, "1").unwrap();
    config.save(&path).unwrap();

    let loaded = ConfigFile::load(&path).unwrap();
    assert_eq!(loaded.get("example.com", TOKEN_KEY).as_deref(), Some("abc123"));
    assert_eq!(loaded.get("example.com", SKIP_TLS_VERIFY_KEY).as_deref(), Some("1"));
}

#[test]
fn setting_empty_value_clears_it() {
    let mut config = ConfigFile::default();
    config.set("example.com", TOKEN_KEY, "abc123").unwrap();
    config.set("example.com", TOKEN_KEY, "").unwrap();
    assert_eq!(config.get("example.com", TOKEN_KEY), None);
}

#[test]
fn unknown_key_is_rejected() {
    let mut config = ConfigFile::default();
    assert!(config.set("example.com", "password", "x").is_err());
    assert!(config.set(" ", TOKEN_KEY, "x").is_err());
}

#[test]
fn env_token_overrides_every_host() {
    let file: ConfigFile = toml::from_str(CONFIG).unwrap();
    let config = app_config(file, Some("glpat-env"));
    assert_eq!(config.get("gitlab.com", TOKEN_KEY).as_deref(), Some("glpat-env"));
    assert_eq!(config.get("elsewhere.dev", TOKEN_KEY).as_deref(), Some("glpat-env"));
    // other keys still come from the file
    assert_eq!(
        config.get("git.corp.internal", CA_CERT_KEY).as_deref(),
        Some("/etc/ssl/corp-root.pem")
    );
}

#[test]
fn custom_config_path_is_used() {
    let path = AppConfig::get_config_path(Some("/tmp/custom/lab.toml"));
    assert_eq!(path, PathBuf::from("/tmp/custom/lab.toml"));
    let default = AppConfig::get_config_path::<&str>(None);
    assert!(default.ends_with(LAB_CONFIG_PATH));
}

#[test]
fn integer_skip_tls_verify_is_accepted() {
    let file: ConfigFile = toml::from_str(
        r#"
[hosts."dev.local"]
skip_tls_verify = 1

[hosts."prod.local"]
skip_tls_verify = 0
"#,
    )
    .unwrap();
    let dev = file.get("dev.local", SKIP_TLS_VERIFY_KEY);
    assert_eq!(dev.as_deref(), Some("1"));
    assert!(is_truthy(dev.as_deref()));
    assert!(!is_truthy(file.get("prod.local", SKIP_TLS_VERIFY_KEY).as_deref()));
}
