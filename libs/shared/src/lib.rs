pub mod host_config;
pub mod instance;
pub mod tls_client;
