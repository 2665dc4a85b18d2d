//! Hosting instance resolution: default host and REST/GraphQL base URLs.

/// Host used when none is configured
pub const DEFAULT_HOSTNAME: &str = "gitlab.com";

/// Environment variable that replaces the default host
pub const HOST_ENV: &str = "LAB_HOST";

/// Maps a host and protocol to the base URLs requests are issued against.
pub trait EndpointResolver: Send + Sync + std::fmt::Debug {
    /// Host to use when the caller supplies none
    fn default_host(&self) -> String;

    /// Base URL for REST traffic, with a trailing slash
    fn api_endpoint(&self, host: &str, protocol: &str) -> String;

    /// Base URL for GraphQL traffic, with a trailing slash
    fn graphql_endpoint(&self, host: &str, protocol: &str) -> String;
}

/// Lowercase a host name and drop a leading `www.`.
pub fn normalize_hostname(host: &str) -> String {
    let host = host.trim().to_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Whether `host` is anything other than the public instance.
pub fn is_self_hosted(host: &str) -> bool {
    normalize_hostname(host) != DEFAULT_HOSTNAME
}

#[derive(Debug, Clone, Default)]
pub struct Instance {
    default_override: Option<String>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance whose default host honours `LAB_HOST`.
    pub fn from_env() -> Self {
        let mut instance = Self::new();
        if let Ok(host) = std::env::var(HOST_ENV) {
            instance.override_default(&host);
        }
        instance
    }

    /// Replace the default host. Empty values are ignored.
    pub fn override_default(&mut self, host: &str) {
        let host = host.trim();
        if !host.is_empty() {
            self.default_override = Some(host.to_string());
        }
    }

    pub fn overridable_default(&self) -> String {
        self.default_override
            .clone()
            .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string())
    }
}

impl EndpointResolver for Instance {
    fn default_host(&self) -> String {
        self.overridable_default()
    }

    fn api_endpoint(&self, host: &str, protocol: &str) -> String {
        if is_self_hosted(host) {
            format!("{}://{}/api/v4/", protocol, host)
        } else {
            format!("https://{}/api/v4/", DEFAULT_HOSTNAME)
        }
    }

    fn graphql_endpoint(&self, host: &str, protocol: &str) -> String {
        if is_self_hosted(host) {
            format!("{}://{}/api/graphql/", protocol, host)
        } else {
            format!("https://{}/api/graphql/", DEFAULT_HOSTNAME)
        }
    }
}
