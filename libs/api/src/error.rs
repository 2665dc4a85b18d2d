use lab_shared::tls_client::TlsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while constructing or using the API client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The custom CA bundle could not be read
    #[error("error reading cert file {}: {source}", .path.display())]
    CertRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The system trust pool could not be obtained
    #[error("failed to load system certificate pool: {0}")]
    CertPool(String),

    /// The underlying client could not be constructed, e.g. a malformed base URL
    #[error("failed to initialize API client: {0}")]
    ClientInit(String),

    /// The HTTP transport could not be assembled
    #[error("failed to build HTTP transport: {0}")]
    Transport(String),

    /// A request was addressed to the wrong kind of endpoint
    #[error("{0}")]
    EndpointMismatch(&'static str),
}

impl From<TlsError> for ClientError {
    fn from(err: TlsError) -> Self {
        match err {
            TlsError::CertRead { path, source } => ClientError::CertRead { path, source },
            TlsError::CertPool(reason) => ClientError::CertPool(reason),
            other => ClientError::Transport(other.to_string()),
        }
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
