//! Authenticated API client bootstrap for the `lab` CLI.
//!
//! [`ApiClient`] owns the connection identity (host, token, protocol, trust
//! policy, endpoint flavour) and lazily builds a [`LabClient`] handle from it.
//! Any change to the staged identity marks the handle stale; the next access
//! rebuilds it exactly once.

pub mod client;
pub mod error;
pub mod global;
pub mod testing;

pub use client::{ApiClient, AuthMode, ClientStatus, Endpoint, LabClient, USER_AGENT};
pub use error::{ClientError, ClientResult};
pub use lab_shared::tls_client::{TransportKind, TrustPolicy};
