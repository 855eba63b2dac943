//! Lease-aware session manager with background renewal.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use validator::Validate;

use super::{SessionManager, SessionState, TokenOperations};
use crate::auth::{ClientAuthentication, VaultToken};
use crate::errors::{Error, Result};

/// Renewal settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LifecycleOptions {
    /// Start the background renewal task
    pub enabled: bool,

    /// How often the renewal task checks the cached token
    #[validate(range(min = 1, max = 3600))]
    pub poll_interval_seconds: u64,

    /// Fraction of the lease below which the token counts as expiring
    #[validate(range(min = 0.0, max = 1.0))]
    pub expiry_threshold: f64,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self { enabled: true, poll_interval_seconds: 5, expiry_threshold: 0.25 }
    }
}

impl LifecycleOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

/// Result of one renewal check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// Nothing to do: no token, a non-expiring token, or plenty of lease left.
    Idle,
    /// The lease was extended.
    Renewed,
    /// The token could not be renewed and was discarded.
    Dropped,
}

/// Session manager that renews its token before the lease runs out.
///
/// Built with [`LifecycleAwareSessionManager::start`], which spawns the renewal
/// task when enabled. The task only holds a weak reference, so dropping the last
/// `Arc` stops it; [`LifecycleAwareSessionManager::shutdown`] stops it
/// deterministically and revokes a login-obtained token.
pub struct LifecycleAwareSessionManager {
    authentication: Arc<dyn ClientAuthentication>,
    operations: Arc<dyn TokenOperations>,
    options: LifecycleOptions,
    token: Mutex<Option<VaultToken>>,
    cancel: CancellationToken,
    renewal_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl LifecycleAwareSessionManager {
    /// Creates the manager and, if `options.enabled`, spawns the renewal task.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if renewal is enabled outside a Tokio runtime
    pub fn start(
        authentication: Arc<dyn ClientAuthentication>,
        operations: Arc<dyn TokenOperations>,
        options: LifecycleOptions,
    ) -> Result<Arc<Self>> {
        if options.enabled && Handle::try_current().is_err() {
            return Err(Error::configuration(
                "Session renewal (vault.lifecycle.enabled) requires a Tokio runtime",
            ));
        }

        let manager = Arc::new(Self {
            authentication,
            operations,
            options,
            token: Mutex::new(None),
            cancel: CancellationToken::new(),
            renewal_task: std::sync::Mutex::new(None),
        });

        if manager.options.enabled {
            let handle = tokio::spawn(run_renewal(
                Arc::downgrade(&manager),
                manager.cancel.clone(),
                manager.options.poll_interval(),
            ));
            if let Ok(mut slot) = manager.renewal_task.lock() {
                *slot = Some(handle);
            }
            info!(
                poll_interval_seconds = manager.options.poll_interval_seconds,
                expiry_threshold = manager.options.expiry_threshold,
                "Started session renewal task"
            );
        }

        Ok(manager)
    }

    fn is_expiring(&self, token: &VaultToken) -> bool {
        match token.remaining_lease() {
            Some(remaining) => {
                let threshold = token.lease_duration().mul_f64(self.options.expiry_threshold);
                remaining <= threshold || remaining <= self.options.poll_interval()
            }
            None => false,
        }
    }

    /// Renews the cached token if its lease is below the threshold.
    ///
    /// Holds the token slot for the duration of the renewal call, so no login can
    /// run concurrently. A token that is not renewable, or whose renewal fails, is
    /// discarded and the next request logs in again.
    pub async fn renew_if_needed(&self) -> RenewalOutcome {
        let mut slot = self.token.lock().await;
        let Some(token) = slot.as_ref() else {
            return RenewalOutcome::Idle;
        };
        if !self.is_expiring(token) {
            return RenewalOutcome::Idle;
        }

        if !token.is_renewable() {
            info!("Session token is expiring and not renewable, dropping it");
            *slot = None;
            return RenewalOutcome::Dropped;
        }

        match self.operations.renew_self(token).await {
            Ok(renewed) => {
                debug!(lease_seconds = renewed.lease_duration().as_secs(), "Renewed session token");
                *slot = Some(renewed);
                RenewalOutcome::Renewed
            }
            Err(e) => {
                warn!(error = %e, "Cannot renew session token, dropping it");
                *slot = None;
                RenewalOutcome::Dropped
            }
        }
    }

    /// Stops the renewal task and revokes a login-obtained token.
    ///
    /// Statically configured tokens are left alone. Revocation failures are logged.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = match self.renewal_task.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Session renewal task ended abnormally");
            }
        }

        let token = self.token.lock().await.take();
        if let Some(token) = token.filter(VaultToken::is_login_token) {
            match self.operations.revoke_self(&token).await {
                Ok(()) => info!("Revoked session token"),
                Err(e) => warn!(error = %e, "Cannot revoke session token"),
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for LifecycleAwareSessionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl SessionManager for LifecycleAwareSessionManager {
    async fn session_token(&self) -> Result<VaultToken> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref().filter(|token| !token.is_expired()) {
            return Ok(token.clone());
        }

        let token = self.authentication.login().await?;
        info!(
            method = %self.authentication.method(),
            renewable = token.is_renewable(),
            lease_seconds = token.lease_duration().as_secs(),
            "Obtained session token"
        );
        *slot = Some(token.clone());
        Ok(token)
    }

    async fn state(&self) -> SessionState {
        match self.token.lock().await.as_ref() {
            None => SessionState::Unauthenticated,
            Some(token) if token.is_expired() => SessionState::Unauthenticated,
            Some(token) if self.is_expiring(token) => SessionState::Expiring,
            Some(_) => SessionState::Authenticated,
        }
    }
}

async fn run_renewal(
    manager: Weak<LifecycleAwareSessionManager>,
    cancel: CancellationToken,
    poll_interval: Duration,
) {
    let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Session renewal task cancelled");
                break;
            }
            _ = ticker.tick() => {
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.renew_if_needed().await;
            }
        }
    }
}
