//! Process-wide client slot.
//!
//! Prefer owning an [`ApiClient`] at the entry point and passing it down. This
//! slot serves call sites that cannot be threaded through; the mutex keeps a
//! stage-then-build sequence atomic when several threads share it.

use crate::client::ApiClient;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

static CLIENT: LazyLock<Mutex<ApiClient>> = LazyLock::new(|| Mutex::new(ApiClient::new()));

/// Lock and return the process-wide client. Hold the guard across a whole
/// mutate-then-build sequence.
pub fn current() -> MutexGuard<'static, ApiClient> {
    // a panic mid-mutation leaves the state stale at worst, never half-built
    CLIENT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Restore the process-wide client to its defaults.
pub fn reset() {
    current().reset();
}
