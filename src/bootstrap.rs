//! Wiring of client, session, registry and composer from a [`VaultConfig`].

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::auth::client_authentication;
use crate::backends::{Resolution, SecretBackendMetadata, SecretBackendRegistry};
use crate::client::{VaultClient, VaultHealth};
use crate::composer::{ConfigView, LeaseRefresher, PropertySourceComposer, VaultPropertyFetcher};
use crate::config::VaultConfig;
use crate::errors::Result;
use crate::session::{LifecycleAwareSessionManager, SessionManager, SimpleSessionManager};

enum Session {
    Simple(Arc<SimpleSessionManager>),
    Lifecycle(Arc<LifecycleAwareSessionManager>),
}

/// Owns the single session shared by every read.
///
/// With `lifecycle.enabled` the session renews its token in the background;
/// otherwise it logs in once and never renews. Creating a bootstrap with renewal
/// enabled outside a Tokio runtime fails with a configuration error.
pub struct VaultBootstrap {
    config: VaultConfig,
    client: VaultClient,
    session: Session,
    registry: SecretBackendRegistry,
}

impl VaultBootstrap {
    /// Validates the configuration and builds the client, authentication and session.
    pub fn new(config: VaultConfig) -> Result<Self> {
        let client = VaultClient::new(config.client_options())?;
        Self::with_client(config, client)
    }

    /// Same as [`VaultBootstrap::new`] on top of a preconfigured client.
    pub fn with_client(config: VaultConfig, client: VaultClient) -> Result<Self> {
        config.validate()?;
        let authentication = client_authentication(&config, &client)?;

        let session = if config.lifecycle.enabled {
            Session::Lifecycle(LifecycleAwareSessionManager::start(
                authentication,
                Arc::new(client.clone()),
                config.lifecycle.clone(),
            )?)
        } else {
            Session::Simple(Arc::new(SimpleSessionManager::new(authentication)))
        };

        Ok(Self { config, client, session, registry: SecretBackendRegistry::with_builtin_factories() })
    }

    /// Replace the backend registry, e.g. to add custom factories.
    pub fn with_registry(mut self, registry: SecretBackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn client(&self) -> &VaultClient {
        &self.client
    }

    pub fn session(&self) -> Arc<dyn SessionManager> {
        match &self.session {
            Session::Simple(session) => session.clone(),
            Session::Lifecycle(session) => session.clone(),
        }
    }

    /// Generic contexts for `profiles`, most specific first.
    pub fn contexts(&self, profiles: &[String]) -> Vec<String> {
        self.config.generic.contexts(profiles)
    }

    /// Generic and backend entries, plus the backend resolution report.
    pub fn plan(
        &self,
        profiles: &[String],
    ) -> Result<(Vec<SecretBackendMetadata>, Resolution)> {
        let generic = self.config.generic.metadata(profiles);
        let resolution = self.registry.resolve(&self.config.backends)?;
        Ok((generic, resolution))
    }

    /// Composes the configuration for `profiles`.
    pub async fn load(&self, profiles: &[String]) -> Result<ConfigView> {
        let (generic, resolution) = self.plan(profiles)?;
        let fetcher = VaultPropertyFetcher::new(self.client.clone(), self.session());
        PropertySourceComposer::new(self.config.fail_fast)
            .compose(generic, resolution.metadata, &fetcher)
            .await
    }

    /// Composes the configuration and keeps its leased sources fresh according
    /// to `lease_refresh`.
    pub async fn load_with_refresh(&self, profiles: &[String]) -> Result<LeaseRefresher> {
        let (generic, resolution) = self.plan(profiles)?;
        let entries = PropertySourceComposer::entries(generic.clone(), resolution.metadata.clone());
        let fetcher = Arc::new(VaultPropertyFetcher::new(self.client.clone(), self.session()));

        let view = PropertySourceComposer::new(self.config.fail_fast)
            .compose(generic, resolution.metadata, fetcher.as_ref())
            .await?;

        Ok(LeaseRefresher::start(
            Arc::new(RwLock::new(view)),
            entries,
            fetcher,
            &self.config.lease_refresh,
        ))
    }

    pub async fn health(&self) -> Result<VaultHealth> {
        self.client.health().await
    }

    /// Stops background renewal and revokes a login-obtained token.
    pub async fn shutdown(&self) {
        if let Session::Lifecycle(session) = &self.session {
            session.shutdown().await;
        }
        info!("vault-config shut down");
    }
}
