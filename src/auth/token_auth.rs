//! Static token authentication.

use async_trait::async_trait;

use super::{AuthenticationMethod, ClientAuthentication, SecretString, VaultToken};
use crate::errors::{Error, Result};

/// Uses a token supplied through configuration. `login` never leaves the process.
#[derive(Debug, Clone)]
pub struct TokenAuthentication {
    token: SecretString,
}

impl TokenAuthentication {
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the token is empty
    pub fn new(token: impl Into<SecretString>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::configuration("Token (vault.token) must not be empty"));
        }
        Ok(Self { token })
    }
}

#[async_trait]
impl ClientAuthentication for TokenAuthentication {
    fn method(&self) -> AuthenticationMethod {
        AuthenticationMethod::Token
    }

    async fn login(&self) -> Result<VaultToken> {
        Ok(VaultToken::of(self.token.clone()))
    }
}
