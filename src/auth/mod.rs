//! Authentication entry point.
//!
//! One [`ClientAuthentication`] implementation per supported scheme. Each turns its
//! scheme-specific parameters into a [`VaultToken`] through a single login call.
//! [`client_authentication`] picks and validates the configured scheme once, at
//! construction time, so a misconfigured scheme never reaches the network.

pub mod app_id;
pub mod approle;
pub mod aws_ec2;
pub mod cert;
pub mod cubbyhole;
pub mod kubernetes;
mod method;
mod secret;
mod token;
pub mod token_auth;

pub use app_id::{AppIdAuthentication, AppIdProperties, AppIdUserIdMechanism};
pub use approle::{AppRoleAuthentication, AppRoleProperties};
pub use aws_ec2::{AwsEc2Authentication, AwsEc2Properties};
pub use cert::{CertProperties, ClientCertificateAuthentication};
pub use cubbyhole::CubbyholeAuthentication;
pub use kubernetes::{KubernetesAuthentication, KubernetesJwtSupplier, KubernetesProperties};
pub use method::AuthenticationMethod;
pub use secret::SecretString;
pub use token::{TokenSource, VaultToken};
pub use token_auth::TokenAuthentication;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::client::VaultClient;
use crate::config::VaultConfig;
use crate::errors::{Error, Result};

/// A way of obtaining a session token from the secret store.
#[async_trait]
pub trait ClientAuthentication: Send + Sync {
    fn method(&self) -> AuthenticationMethod;

    /// Performs the login. Implementations validate their inputs before any
    /// request is sent.
    async fn login(&self) -> Result<VaultToken>;
}

/// Builds the strategy selected by `config.authentication`.
///
/// # Errors
///
/// - [`Error::Configuration`] if a parameter required by the selected scheme is missing
pub fn client_authentication(
    config: &VaultConfig,
    client: &VaultClient,
) -> Result<Arc<dyn ClientAuthentication>> {
    let method = config.authentication;
    debug!(method = %method, "Configuring client authentication");

    let configured_token = || {
        config.token.clone().ok_or_else(|| {
            Error::configuration(format!("Token (vault.token) is required for {} authentication", method))
        })
    };

    let authentication: Arc<dyn ClientAuthentication> = match method {
        AuthenticationMethod::Token => Arc::new(TokenAuthentication::new(configured_token()?)?),
        AuthenticationMethod::Approle => {
            Arc::new(AppRoleAuthentication::new(&config.app_role, client.clone())?)
        }
        AuthenticationMethod::Appid => Arc::new(AppIdAuthentication::new(
            &config.app_id,
            &config.generic.application_name,
            client.clone(),
        )?),
        AuthenticationMethod::Cert => {
            Arc::new(ClientCertificateAuthentication::new(&config.cert, client.clone()))
        }
        AuthenticationMethod::AwsEc2 => {
            Arc::new(AwsEc2Authentication::new(&config.aws_ec2, client.clone())?)
        }
        AuthenticationMethod::Kubernetes => {
            let role = config.kubernetes.role.as_deref().map(str::trim).unwrap_or_default();
            if role.is_empty() {
                return Err(Error::configuration(
                    "Role (vault.kubernetes.role) must not be empty",
                ));
            }
            Arc::new(KubernetesAuthentication::new(&config.kubernetes, client.clone()))
        }
        AuthenticationMethod::Cubbyhole => {
            Arc::new(CubbyholeAuthentication::new(configured_token()?, client.clone())?)
        }
    };

    Ok(authentication)
}
