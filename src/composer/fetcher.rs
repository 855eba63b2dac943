use std::sync::Arc;

use async_trait::async_trait;

use crate::client::{SecretResponse, VaultClient};
use crate::errors::Result;
use crate::session::SessionManager;

/// Reads one secret path. `Ok(None)` means the path does not exist.
#[async_trait]
pub trait PropertyFetcher: Send + Sync {
    /// Called once per composition before any read.
    ///
    /// An error here stands for every entry of the cycle, so a rejected login
    /// is not repeated per path.
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, path: &str) -> Result<Option<SecretResponse>>;
}

/// Authenticated reads through the shared session.
#[derive(Clone)]
pub struct VaultPropertyFetcher {
    client: VaultClient,
    session: Arc<dyn SessionManager>,
}

impl VaultPropertyFetcher {
    pub fn new(client: VaultClient, session: Arc<dyn SessionManager>) -> Self {
        Self { client, session }
    }
}

#[async_trait]
impl PropertyFetcher for VaultPropertyFetcher {
    async fn prepare(&self) -> Result<()> {
        self.session.session_token().await.map(|_| ())
    }

    async fn fetch(&self, path: &str) -> Result<Option<SecretResponse>> {
        let token = self.session.session_token().await?;
        self.client.read(path, &token).await
    }
}
