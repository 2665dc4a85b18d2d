//! Client state, lazy factory and accessors.
//!
//! [`ApiClient`] is the single source of truth for connection identity. It is
//! owned by the application entry point and passed to whatever needs it; the
//! [`crate::global`] slot exists for call sites that cannot be threaded
//! through. The built handle lives in a two-state slot:
//!
//! - `Stale`: identity changed since the last build (or nothing was built
//!   yet). The previous handle, if any, is kept until a build succeeds.
//! - `Built`: the handle matches the staged identity.
//!
//! Every setter moves `Built -> Stale`; only [`ApiClient::ensure_built`] moves
//! `Stale -> Built`.

mod handle;

pub use handle::{Endpoint, LabClient, PRIVATE_TOKEN_HEADER, USER_AGENT};

use crate::error::{ClientError, ClientResult};
use handle::parse_base_url;
use lab_shared::host_config::{
    API_PROTOCOL_KEY, CA_CERT_KEY, HostConfig, SKIP_TLS_VERIFY_KEY, TOKEN_KEY, is_truthy,
};
use lab_shared::instance::{EndpointResolver, Instance};
use lab_shared::tls_client::{TlsClientConfig, Transport, TrustPolicy, build_transport};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_PROTOCOL: &str = "https";

/// How requests are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    None,
    /// Reserved; nothing produces it yet
    OAuthToken,
    PrivateToken,
}

/// Outcome of best-effort handle access.
#[derive(Debug)]
pub enum ClientStatus<'a> {
    Ready(&'a LabClient),
    /// The handle could not be built; requests would go nowhere
    Degraded(ClientError),
}

impl<'a> ClientStatus<'a> {
    pub fn ready(&self) -> Option<&'a LabClient> {
        match self {
            ClientStatus::Ready(client) => Some(*client),
            ClientStatus::Degraded(_) => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ClientStatus::Degraded(_))
    }

    pub fn into_result(self) -> ClientResult<&'a LabClient> {
        match self {
            ClientStatus::Ready(client) => Ok(client),
            ClientStatus::Degraded(err) => Err(err),
        }
    }
}

#[derive(Debug)]
enum Slot {
    Stale { previous: Option<LabClient> },
    Built(LabClient),
}

impl Slot {
    fn invalidate(&mut self) {
        let current = std::mem::replace(self, Slot::Stale { previous: None });
        *self = match current {
            Slot::Built(client) => Slot::Stale {
                previous: Some(client),
            },
            stale => stale,
        };
    }
}

/// Connection identity plus the lazily built handle.
#[derive(Debug)]
pub struct ApiClient {
    host: String,
    token: String,
    protocol: String,
    auth_mode: AuthMode,
    trust_policy: TrustPolicy,
    is_graphql: bool,
    transport_override: Option<Transport>,
    transport_config: TlsClientConfig,
    resolver: Arc<dyn EndpointResolver>,
    slot: Slot,
    generation: u64,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    /// Fresh state resolving hosts through [`Instance::from_env`].
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(Instance::from_env()))
    }

    pub fn with_resolver(resolver: Arc<dyn EndpointResolver>) -> Self {
        Self {
            host: String::new(),
            token: String::new(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            auth_mode: AuthMode::None,
            trust_policy: TrustPolicy::SystemDefault,
            is_graphql: false,
            transport_override: None,
            transport_config: TlsClientConfig::default(),
            resolver,
            slot: Slot::Stale { previous: None },
            generation: 0,
        }
    }

    /// Settings applied to every transport built from a trust policy.
    pub fn with_transport_config(mut self, config: TlsClientConfig) -> Self {
        self.transport_config = config;
        self.slot.invalidate();
        self
    }

    /// Back to defaults, dropping the handle and any override. The resolver
    /// and transport settings are collaborators, not identity, and are kept.
    pub fn reset(&mut self) {
        let resolver = Arc::clone(&self.resolver);
        let transport_config = self.transport_config.clone();
        *self = Self::with_resolver(resolver).with_transport_config(transport_config);
    }

    // =========================================================================
    // Construction entry points
    // =========================================================================

    /// Stage host, token and skip-verify policy, then build.
    pub fn connect(
        &mut self,
        host: &str,
        token: &str,
        allow_insecure: bool,
        is_graphql: bool,
    ) -> ClientResult<&LabClient> {
        let policy = if allow_insecure {
            TrustPolicy::SkipVerify
        } else {
            TrustPolicy::SystemDefault
        };
        self.stage(host, token, policy, is_graphql);
        self.ensure_built()
    }

    /// Stage host, token and a custom CA bundle, then build.
    pub fn connect_with_custom_ca(
        &mut self,
        host: &str,
        token: &str,
        ca_file: impl AsRef<Path>,
        is_graphql: bool,
    ) -> ClientResult<&LabClient> {
        let policy = TrustPolicy::CustomCa(ca_file.as_ref().to_path_buf());
        self.stage(host, token, policy, is_graphql);
        self.ensure_built()
    }

    /// Stage everything from the per-host configuration, then build.
    ///
    /// An empty `repo_host` resolves to the resolver's default host.
    pub fn connect_with_config(
        &mut self,
        repo_host: &str,
        config: &dyn HostConfig,
        is_graphql: bool,
    ) -> ClientResult<&LabClient> {
        let host = if repo_host.is_empty() {
            self.resolver.default_host()
        } else {
            repo_host.to_string()
        };

        let token = config.get(&host, TOKEN_KEY).unwrap_or_default();
        let skip_verify = is_truthy(config.get(&host, SKIP_TLS_VERIFY_KEY).as_deref());
        let ca_cert = config.get(&host, CA_CERT_KEY);
        let policy = TrustPolicy::from_settings(skip_verify, ca_cert.as_deref());

        if let Some(protocol) = config.get(&host, API_PROTOCOL_KEY).filter(|p| !p.is_empty()) {
            self.set_protocol(&protocol);
        }
        self.stage(&host, &token, policy, is_graphql);
        self.ensure_built()
    }

    fn stage(&mut self, host: &str, token: &str, policy: TrustPolicy, is_graphql: bool) {
        self.set_host(host);
        self.set_token(token);
        self.set_trust_policy(policy);
        self.set_graphql(is_graphql);
    }

    // =========================================================================
    // Factory
    // =========================================================================

    /// Build the handle if the staged identity changed, otherwise return the
    /// existing one untouched.
    ///
    /// On failure the previous handle stays where it was and the state stays
    /// stale, so the next call retries.
    pub fn ensure_built(&mut self) -> ClientResult<&LabClient> {
        if !self.is_built() {
            self.rebuild()?;
        }
        match &self.slot {
            Slot::Built(client) => Ok(client),
            Slot::Stale { .. } => Err(ClientError::ClientInit(
                "client state is stale after rebuild".to_string(),
            )),
        }
    }

    fn rebuild(&mut self) -> ClientResult<()> {
        if self.host.is_empty() {
            self.host = self.resolver.default_host();
        }

        let (endpoint, raw_base_url) = if self.is_graphql {
            (
                Endpoint::GraphQL,
                self.resolver.graphql_endpoint(&self.host, &self.protocol),
            )
        } else {
            (
                Endpoint::Rest,
                self.resolver.api_endpoint(&self.host, &self.protocol),
            )
        };
        let base_url = parse_base_url(&raw_base_url)?;

        let transport = match &self.transport_override {
            Some(transport) => transport.clone(),
            None => build_transport(&self.trust_policy, &self.transport_config)?,
        };

        let client = LabClient::new(transport, base_url, endpoint, &self.token);
        debug!(
            host = %self.host,
            base_url = %client.base_url(),
            transport = %client.transport_kind(),
            "built API client"
        );

        self.auth_mode = if self.token.is_empty() {
            AuthMode::None
        } else {
            AuthMode::PrivateToken
        };
        self.slot = Slot::Built(client);
        self.generation += 1;
        Ok(())
    }

    /// Best-effort access: build if needed and report degradation instead of
    /// failing.
    pub fn get(&mut self) -> ClientStatus<'_> {
        match self.ensure_built() {
            Ok(client) => ClientStatus::Ready(client),
            Err(err) => {
                warn!(error = %err, "API client unavailable");
                ClientStatus::Degraded(err)
            }
        }
    }

    pub fn base_url(&mut self) -> ClientResult<&reqwest::Url> {
        self.ensure_built().map(LabClient::base_url)
    }

    pub fn is_built(&self) -> bool {
        matches!(self.slot, Slot::Built(_))
    }

    pub fn is_stale(&self) -> bool {
        !self.is_built()
    }

    /// The most recent handle, current or stale, without building.
    pub fn last_built(&self) -> Option<&LabClient> {
        match &self.slot {
            Slot::Built(client) => Some(client),
            Slot::Stale { previous } => previous.as_ref(),
        }
    }

    /// Number of successful builds since creation or the last reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn set_host(&mut self, host: &str) {
        self.host = host.to_string();
        self.slot.invalidate();
    }

    pub fn set_token(&mut self, token: &str) {
        self.token = token.to_string();
        self.slot.invalidate();
    }

    pub fn set_protocol(&mut self, protocol: &str) {
        self.protocol = protocol.to_string();
        self.slot.invalidate();
    }

    pub fn set_graphql(&mut self, is_graphql: bool) {
        self.is_graphql = is_graphql;
        self.slot.invalidate();
    }

    pub fn set_trust_policy(&mut self, policy: TrustPolicy) {
        self.trust_policy = policy;
        self.slot.invalidate();
    }

    /// Use `client` for all traffic. Takes effect on the current handle right
    /// away; nothing is rebuilt.
    pub fn override_transport(&mut self, client: reqwest::Client) {
        let transport = Transport::overridden(client);
        match &mut self.slot {
            Slot::Built(handle) => handle.rebind(transport.clone()),
            Slot::Stale {
                previous: Some(handle),
            } => handle.rebind(transport.clone()),
            Slot::Stale { previous: None } => {}
        }
        self.transport_override = Some(transport);
    }

    /// Drop the override; the next build uses the trust policy again.
    pub fn clear_override(&mut self) {
        if self.transport_override.take().is_some() {
            self.slot.invalidate();
        }
    }

    pub fn has_override(&self) -> bool {
        self.transport_override.is_some()
    }

    /// The client traffic goes through: the override if set, else the built
    /// handle's.
    pub fn http_client(&self) -> Option<&reqwest::Client> {
        match (&self.transport_override, &self.slot) {
            (Some(transport), _) => Some(transport.client()),
            (None, Slot::Built(handle)) => Some(handle.http_client()),
            (None, Slot::Stale { .. }) => None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn is_graphql(&self) -> bool {
        self.is_graphql
    }

    pub fn trust_policy(&self) -> &TrustPolicy {
        &self.trust_policy
    }

    /// Auth mode as of the last successful build.
    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }
}
