//! Response-wrapped token authentication.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{info, warn};

use super::{AuthenticationMethod, ClientAuthentication, SecretString, VaultToken};
use crate::client::VaultClient;
use crate::errors::{Error, Result};

const UNWRAP_PATH: &str = "sys/wrapping/unwrap";

/// Exchanges a single-use wrapping token for the real session token.
///
/// The wrapping token is spent on the first successful unwrap. Later logins fail
/// locally instead of presenting the spent token again.
#[derive(Debug)]
pub struct CubbyholeAuthentication {
    wrapping_token: SecretString,
    unwrapped: AtomicBool,
    client: VaultClient,
}

impl CubbyholeAuthentication {
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the wrapping token is empty
    pub fn new(wrapping_token: impl Into<SecretString>, client: VaultClient) -> Result<Self> {
        let wrapping_token = wrapping_token.into();
        if wrapping_token.is_empty() {
            return Err(Error::configuration(
                "Wrapping token (vault.token) must not be empty for cubbyhole authentication",
            ));
        }
        Ok(Self { wrapping_token, unwrapped: AtomicBool::new(false), client })
    }

    pub fn is_unwrapped(&self) -> bool {
        self.unwrapped.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ClientAuthentication for CubbyholeAuthentication {
    fn method(&self) -> AuthenticationMethod {
        AuthenticationMethod::Cubbyhole
    }

    async fn login(&self) -> Result<VaultToken> {
        if self.is_unwrapped() {
            warn!("Wrapping token already used, refusing to unwrap again");
            return Err(Error::authentication(
                "Cannot login using Cubbyhole: wrapping token was already unwrapped",
            ));
        }

        let token = self
            .client
            .login::<()>("Cubbyhole", UNWRAP_PATH, None, Some(self.wrapping_token.expose_secret()))
            .await?;

        self.unwrapped.store(true, Ordering::Release);
        info!(renewable = token.is_renewable(), "Unwrapped session token");
        Ok(token)
    }
}
