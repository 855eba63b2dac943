use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{SessionManager, SessionState};
use crate::auth::{ClientAuthentication, VaultToken};
use crate::errors::Result;

/// Logs in on first use and keeps the token for the life of the manager.
///
/// There is no renewal. Once the token expires, reads fail with an
/// authentication error until the caller calls [`SimpleSessionManager::invalidate`].
pub struct SimpleSessionManager {
    authentication: Arc<dyn ClientAuthentication>,
    token: Mutex<Option<VaultToken>>,
}

impl SimpleSessionManager {
    pub fn new(authentication: Arc<dyn ClientAuthentication>) -> Self {
        Self { authentication, token: Mutex::new(None) }
    }

    /// Drops the cached token so the next request logs in again.
    pub async fn invalidate(&self) {
        if self.token.lock().await.take().is_some() {
            debug!("Session token invalidated");
        }
    }
}

#[async_trait]
impl SessionManager for SimpleSessionManager {
    async fn session_token(&self) -> Result<VaultToken> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let token = self.authentication.login().await?;
        info!(method = %self.authentication.method(), "Obtained session token");
        *slot = Some(token.clone());
        Ok(token)
    }

    async fn state(&self) -> SessionState {
        match self.token.lock().await.as_ref() {
            Some(_) => SessionState::Authenticated,
            None => SessionState::Unauthenticated,
        }
    }
}
