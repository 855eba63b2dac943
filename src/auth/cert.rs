//! TLS client-certificate authentication.
//!
//! The certificate is presented during the TLS handshake, so the login call has
//! no body. Build the [`VaultClient`] with [`VaultClient::with_http_client`] and a
//! `reqwest::Client` carrying the identity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AuthenticationMethod, ClientAuthentication, VaultToken};
use crate::client::VaultClient;
use crate::errors::Result;

/// Cert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertProperties {
    /// Mount path of the cert auth backend
    pub path: String,
}

impl Default for CertProperties {
    fn default() -> Self {
        Self { path: "cert".to_string() }
    }
}

#[derive(Debug, Clone)]
pub struct ClientCertificateAuthentication {
    path: String,
    client: VaultClient,
}

impl ClientCertificateAuthentication {
    pub fn new(properties: &CertProperties, client: VaultClient) -> Self {
        Self { path: properties.path.trim_matches('/').to_string(), client }
    }
}

#[async_trait]
impl ClientAuthentication for ClientCertificateAuthentication {
    fn method(&self) -> AuthenticationMethod {
        AuthenticationMethod::Cert
    }

    async fn login(&self) -> Result<VaultToken> {
        self.client
            .login::<()>("TLS Certificates", &format!("auth/{}/login", self.path), None, None)
            .await
    }
}
