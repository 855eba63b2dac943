//! Session management.
//!
//! A session manager owns the one piece of mutable shared state in the crate: the
//! current [`VaultToken`]. Every component that needs authenticated access gets
//! the same manager instance and asks it for a token; it never logs in itself.
//!
//! Both implementations hold their token slot under an async mutex for the whole
//! duration of a login or renewal, so concurrent callers against an
//! unauthenticated session wait for the single in-flight login instead of
//! starting their own.

mod lifecycle;
mod simple;

pub use lifecycle::{LifecycleAwareSessionManager, LifecycleOptions, RenewalOutcome};
pub use simple::SimpleSessionManager;

use async_trait::async_trait;

use crate::auth::VaultToken;
use crate::errors::Result;

/// Supplies the token used for secret reads.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Returns the cached token, logging in first if there is none.
    async fn session_token(&self) -> Result<VaultToken>;

    /// Current position in the session state machine.
    async fn state(&self) -> SessionState;
}

/// Token self-management calls. Implemented by [`crate::client::VaultClient`];
/// tests substitute fakes.
#[async_trait]
pub trait TokenOperations: Send + Sync {
    /// Extends the token's lease, returning the token with its new lease.
    async fn renew_self(&self, token: &VaultToken) -> Result<VaultToken>;

    /// Revokes the token.
    async fn revoke_self(&self, token: &VaultToken) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No cached token; the next request logs in.
    Unauthenticated,
    /// A valid token is cached.
    Authenticated,
    /// The cached token's lease is below the renewal threshold.
    Expiring,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::Expiring => "expiring",
        };
        f.write_str(name)
    }
}
