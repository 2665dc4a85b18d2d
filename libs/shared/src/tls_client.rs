//! HTTP transport construction.
//!
//! Every connection to a hosting instance goes through a [`Transport`] built
//! here. Exactly one of three trust policies applies per build:
//!
//! - [`TrustPolicy::SystemDefault`]: rustls with the OS-provided verifier
//!   (`rustls-platform-verifier`).
//! - [`TrustPolicy::CustomCa`]: the system root store extended with the
//!   certificates of a PEM bundle. System trust is kept, not replaced.
//! - [`TrustPolicy::SkipVerify`]: certificate verification disabled. Only
//!   ever selected on explicit request.

use reqwest::{Client, ClientBuilder, header::HeaderMap};
use rustls::RootCertStore;
use rustls::pki_types::CertificateDer;
use rustls_platform_verifier::BuilderVerifierExt;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// TCP connect timeout.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(30);
/// TCP keep-alive interval.
pub const KEEP_ALIVE: Duration = Duration::from_secs(30);
/// How long an idle pooled connection is kept.
pub const IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(90);
/// Budget for the TLS handshake, on top of [`DIAL_TIMEOUT`].
pub const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum idle connections kept in the pool.
pub const MAX_IDLE_CONNS: usize = 100;

/// Errors raised while building a transport
#[derive(Error, Debug)]
pub enum TlsError {
    /// The custom CA bundle could not be read or is not valid PEM
    #[error("error reading cert file {}: {source}", .path.display())]
    CertRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The baseline system trust pool could not be obtained
    #[error("failed to load system certificate pool: {0}")]
    CertPool(String),

    /// rustls rejected the TLS configuration
    #[error("failed to build TLS config: {0}")]
    TlsConfig(String),

    /// reqwest failed to assemble the client
    #[error("failed to create HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Result type alias for transport construction
pub type TlsResult<T> = Result<T, TlsError>;

/// Which certificate authorities a transport accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrustPolicy {
    #[default]
    SystemDefault,
    SkipVerify,
    CustomCa(PathBuf),
}

impl TrustPolicy {
    /// Derive a policy from the per-host settings.
    ///
    /// A custom CA takes precedence over `skip_verify`: when both are set the
    /// bundle is used and certificates are still verified.
    pub fn from_settings(skip_verify: bool, ca_cert: Option<&str>) -> Self {
        match ca_cert.map(str::trim).filter(|path| !path.is_empty()) {
            Some(path) => {
                if skip_verify {
                    warn!(
                        ca_cert = path,
                        "both ca_cert and skip_tls_verify are set; using ca_cert and keeping verification on"
                    );
                }
                Self::CustomCa(PathBuf::from(path))
            }
            None if skip_verify => Self::SkipVerify,
            None => Self::SystemDefault,
        }
    }
}

/// The construction path a transport came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    SystemDefault,
    CustomCa,
    SkipVerify,
    /// Supplied from outside, no trust policy applied here
    Override,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::SystemDefault => write!(f, "system-default"),
            TransportKind::CustomCa => write!(f, "custom-ca"),
            TransportKind::SkipVerify => write!(f, "skip-verify"),
            TransportKind::Override => write!(f, "override"),
        }
    }
}

/// An HTTP client tagged with how it was built.
#[derive(Clone, Debug)]
pub struct Transport {
    client: Client,
    kind: TransportKind,
}

impl Transport {
    /// Wrap an externally supplied client.
    pub fn overridden(client: Client) -> Self {
        Self {
            client,
            kind: TransportKind::Override,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }
}

/// Settings shared by every construction path.
#[derive(Debug, Clone)]
pub struct TlsClientConfig {
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY`
    pub proxy_from_env: bool,
    /// Offer h2 over ALPN
    pub attempt_http2: bool,
}

impl Default for TlsClientConfig {
    fn default() -> Self {
        Self {
            headers: HeaderMap::new(),
            timeout: None,
            proxy_from_env: true,
            attempt_http2: true,
        }
    }
}

impl TlsClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn builder(&self) -> ClientBuilder {
        let mut builder = Client::builder()
            .default_headers(self.headers.clone())
            .connect_timeout(DIAL_TIMEOUT + TLS_HANDSHAKE_TIMEOUT)
            .tcp_keepalive(KEEP_ALIVE)
            .pool_idle_timeout(IDLE_CONN_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_CONNS);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if !self.proxy_from_env {
            builder = builder.no_proxy();
        }
        if !self.attempt_http2 {
            builder = builder.http1_only();
        }
        builder
    }

    fn alpn_protocols(&self) -> Vec<Vec<u8>> {
        if self.attempt_http2 {
            vec![b"h2".to_vec(), b"http/1.1".to_vec()]
        } else {
            vec![b"http/1.1".to_vec()]
        }
    }
}

fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Create an HTTP client that validates certificates against the OS store.
pub fn create_tls_client(config: TlsClientConfig) -> TlsResult<Client> {
    // needed to use OS-provided CA certificates with Rustls
    let mut tls_config = rustls::ClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| TlsError::TlsConfig(e.to_string()))?
        .with_platform_verifier()
        .with_no_client_auth();
    tls_config.alpn_protocols = config.alpn_protocols();

    Ok(config.builder().use_preconfigured_tls(tls_config).build()?)
}

pub fn build_default(config: &TlsClientConfig) -> TlsResult<Client> {
    create_tls_client(config.clone())
}

/// Certificates are not verified at all.
pub fn build_insecure(config: &TlsClientConfig) -> TlsResult<Client> {
    Ok(config
        .builder()
        .use_rustls_tls()
        .danger_accept_invalid_certs(true)
        .build()?)
}

/// Trust the system pool plus every certificate in the PEM file at `path`.
pub fn build_with_custom_ca(path: &Path, config: &TlsClientConfig) -> TlsResult<Client> {
    let cert_read = |source| TlsError::CertRead {
        path: path.to_path_buf(),
        source,
    };

    let pem = std::fs::read(path).map_err(cert_read)?;
    // use system cert pool as a baseline
    let mut roots = system_root_store()?;

    let custom: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<Result<_, _>>()
        .map_err(cert_read)?;
    if custom.is_empty() {
        warn!(path = %path.display(), "no PEM certificates found in ca_cert file");
    }
    let (added, ignored) = roots.add_parsable_certificates(custom);
    debug!(added, ignored, path = %path.display(), "appended custom CA certificates");

    let mut tls_config = rustls::ClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| TlsError::TlsConfig(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    tls_config.alpn_protocols = config.alpn_protocols();

    Ok(config.builder().use_preconfigured_tls(tls_config).build()?)
}

fn system_root_store() -> TlsResult<RootCertStore> {
    let loaded = rustls_native_certs::load_native_certs();
    root_store_from(loaded.certs, &loaded.errors)
}

/// An absent system bundle yields an empty store; only sources that exist but
/// cannot be read, with nothing else loaded, are a `CertPool` error.
fn root_store_from<E: fmt::Display>(
    certs: Vec<CertificateDer<'static>>,
    errors: &[E],
) -> TlsResult<RootCertStore> {
    if certs.is_empty() && !errors.is_empty() {
        let reason = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TlsError::CertPool(reason));
    }
    for error in errors {
        debug!(%error, "skipped unreadable system certificate source");
    }
    if certs.is_empty() {
        warn!("no system certificates found; only the ca_cert bundle will be trusted");
    }

    let mut roots = RootCertStore::empty();
    roots.add_parsable_certificates(certs);
    Ok(roots)
}

/// Build a transport for `policy`, taking exactly one construction path.
pub fn build_transport(policy: &TrustPolicy, config: &TlsClientConfig) -> TlsResult<Transport> {
    let (client, kind) = match policy {
        TrustPolicy::SystemDefault => (build_default(config)?, TransportKind::SystemDefault),
        TrustPolicy::SkipVerify => (build_insecure(config)?, TransportKind::SkipVerify),
        TrustPolicy::CustomCa(path) => (
            build_with_custom_ca(path, config)?,
            TransportKind::CustomCa,
        ),
    };
    info!(%kind, "built HTTP transport");
    Ok(Transport { client, kind })
}
