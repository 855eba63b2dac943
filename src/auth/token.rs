//! Session token returned by a successful login.

use std::time::Duration;

use tokio::time::Instant;

use super::secret::SecretString;
use crate::client::AuthInfo;
use crate::errors::{Error, Result};

/// Where a token came from. Only tokens obtained through a login are renewed
/// by the session manager or revoked on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Supplied directly through configuration.
    Static,
    /// Issued by the store in response to a login call.
    Login,
}

/// A credential for the secret store together with its lease.
///
/// A `lease_duration` of zero means the token does not expire. Values of this type
/// only exist once a login has succeeded; an unauthenticated session simply holds
/// no token.
#[derive(Debug, Clone)]
pub struct VaultToken {
    token: SecretString,
    lease_duration: Duration,
    renewable: bool,
    issued_at: Instant,
    source: TokenSource,
}

impl VaultToken {
    /// A statically configured, non-expiring token.
    pub fn of(token: impl Into<SecretString>) -> Self {
        Self {
            token: token.into(),
            lease_duration: Duration::ZERO,
            renewable: false,
            issued_at: Instant::now(),
            source: TokenSource::Static,
        }
    }

    /// A login token that cannot be renewed.
    pub fn login(token: impl Into<SecretString>, lease_duration: Duration) -> Self {
        Self {
            token: token.into(),
            lease_duration,
            renewable: false,
            issued_at: Instant::now(),
            source: TokenSource::Login,
        }
    }

    /// A login token the store allows us to renew.
    pub fn renewable(token: impl Into<SecretString>, lease_duration: Duration) -> Self {
        Self { renewable: true, ..Self::login(token, lease_duration) }
    }

    /// Derive a token from the `auth` block of a login response.
    ///
    /// `renewable = true` yields a renewable token with the declared lease; otherwise a
    /// declared lease yields a non-renewable token with that lease; otherwise the token
    /// does not expire.
    pub fn from_auth(auth: &AuthInfo) -> Result<Self> {
        let token = match auth.client_token.as_deref() {
            Some(token) if !token.trim().is_empty() => token,
            _ => return Err(Error::authentication("login response is missing client_token")),
        };

        let lease = auth.lease_duration.map(Duration::from_secs);

        Ok(match (auth.renewable, lease) {
            (Some(true), lease) => Self::renewable(token, lease.unwrap_or_default()),
            (_, Some(lease)) => Self::login(token, lease),
            (_, None) => Self { source: TokenSource::Login, ..Self::of(token) },
        })
    }

    /// The raw token value, for the `X-Vault-Token` header only.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn lease_duration(&self) -> Duration {
        self.lease_duration
    }

    pub fn is_renewable(&self) -> bool {
        self.renewable
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    pub fn source(&self) -> TokenSource {
        self.source
    }

    pub fn is_login_token(&self) -> bool {
        self.source == TokenSource::Login
    }

    /// Whether the token carries a lease at all.
    pub fn expires(&self) -> bool {
        !self.lease_duration.is_zero()
    }

    /// Remaining lease, or `None` for non-expiring tokens.
    pub fn remaining_lease(&self) -> Option<Duration> {
        if !self.expires() {
            return None;
        }
        Some(self.lease_duration.saturating_sub(self.issued_at.elapsed()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_lease().is_some_and(|remaining| remaining.is_zero())
    }

    /// The same token with a fresh lease starting now.
    pub fn with_lease(&self, lease_duration: Duration, renewable: bool) -> Self {
        Self {
            token: self.token.clone(),
            lease_duration,
            renewable,
            issued_at: Instant::now(),
            source: self.source,
        }
    }
}
