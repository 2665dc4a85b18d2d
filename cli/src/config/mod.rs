//! Configuration management for the Lab CLI.
//!
//! Settings live in a TOML file, one table per host:
//!
//! ```toml
//! [hosts."gitlab.com"]
//! token = "glpat-..."
//!
//! [hosts."git.corp.internal"]
//! token = "glpat-..."
//! ca_cert = "/etc/ssl/corp-root.pem"
//! api_protocol = "https"
//!
//! [hosts."dev.local"]
//! skip_tls_verify = true
//! ```

mod app;
mod file;

#[cfg(test)]
mod tests;

pub use app::AppConfig;
pub use file::ConfigFile;

// Constants
pub const LAB_CONFIG_PATH: &str = ".lab/config.toml";
/// Overrides the stored token for every host
pub const TOKEN_ENV: &str = "LAB_TOKEN";
