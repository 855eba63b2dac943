//! Kubernetes service-account authentication.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AuthenticationMethod, ClientAuthentication, VaultToken};
use crate::client::VaultClient;
use crate::errors::{Error, Result};

pub const DEFAULT_SERVICE_ACCOUNT_TOKEN_FILE: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Kubernetes settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesProperties {
    /// Role bound to the service account in the store
    pub role: Option<String>,

    /// Mount path of the kubernetes auth backend
    pub path: String,

    /// Projected service account token
    pub service_account_token_file: PathBuf,
}

impl Default for KubernetesProperties {
    fn default() -> Self {
        Self {
            role: None,
            path: "kubernetes".to_string(),
            service_account_token_file: PathBuf::from(DEFAULT_SERVICE_ACCOUNT_TOKEN_FILE),
        }
    }
}

/// Source of the service account JWT. Called on every login so rotated
/// projected tokens are picked up.
pub trait KubernetesJwtSupplier: Send + Sync {
    fn jwt(&self) -> Result<String>;
}

impl<F> KubernetesJwtSupplier for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn jwt(&self) -> Result<String> {
        self()
    }
}

/// Reads the JWT from a file.
#[derive(Debug, Clone)]
pub struct FileJwtSupplier {
    path: PathBuf,
}

impl FileJwtSupplier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KubernetesJwtSupplier for FileJwtSupplier {
    fn jwt(&self) -> Result<String> {
        let jwt = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::validation(format!(
                "Cannot read service account token from {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(jwt.trim().to_string())
    }
}

/// Logs in by posting `{role, jwt}` to `auth/{path}/login`.
#[derive(Clone)]
pub struct KubernetesAuthentication {
    role: String,
    path: String,
    jwt_supplier: Arc<dyn KubernetesJwtSupplier>,
    client: VaultClient,
}

impl fmt::Debug for KubernetesAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubernetesAuthentication")
            .field("role", &self.role)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl KubernetesAuthentication {
    /// Uses the configured service account token file.
    pub fn new(properties: &KubernetesProperties, client: VaultClient) -> Self {
        Self::with_supplier(
            properties.role.clone().unwrap_or_default(),
            &properties.path,
            Arc::new(FileJwtSupplier::new(&properties.service_account_token_file)),
            client,
        )
    }

    pub fn with_supplier(
        role: impl Into<String>,
        path: &str,
        jwt_supplier: Arc<dyn KubernetesJwtSupplier>,
        client: VaultClient,
    ) -> Self {
        Self {
            role: role.into().trim().to_string(),
            path: path.trim_matches('/').to_string(),
            jwt_supplier,
            client,
        }
    }
}

#[async_trait]
impl ClientAuthentication for KubernetesAuthentication {
    fn method(&self) -> AuthenticationMethod {
        AuthenticationMethod::Kubernetes
    }

    async fn login(&self) -> Result<VaultToken> {
        if self.role.is_empty() {
            return Err(Error::validation("Role (vault.kubernetes.role) must not be empty"));
        }
        let jwt = self.jwt_supplier.jwt()?;
        if jwt.trim().is_empty() {
            return Err(Error::validation("Service account JWT must not be empty"));
        }

        let body = json!({ "role": self.role, "jwt": jwt });
        self.client
            .login("Kubernetes", &format!("auth/{}/login", self.path), Some(&body), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientOptions;

    fn client() -> VaultClient {
        // Nothing listens here; validation must fail before any request is sent.
        VaultClient::new(ClientOptions { address: "http://127.0.0.1:1".into(), ..Default::default() })
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_role_fails_before_network() {
        let supplier: Arc<dyn KubernetesJwtSupplier> = Arc::new(|| -> Result<String> { Ok("jwt".to_string()) });
        let auth = KubernetesAuthentication::with_supplier("", "kubernetes", supplier, client());
        assert!(matches!(auth.login().await, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_empty_jwt_fails_before_network() {
        let supplier: Arc<dyn KubernetesJwtSupplier> = Arc::new(|| -> Result<String> { Ok("  ".to_string()) });
        let auth = KubernetesAuthentication::with_supplier("my-role", "kubernetes", supplier, client());
        assert!(matches!(auth.login().await, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_file_supplier_trims_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "eyJhbGciOi.payload.sig\n").unwrap();

        assert_eq!(FileJwtSupplier::new(&path).jwt().unwrap(), "eyJhbGciOi.payload.sig");
        assert!(FileJwtSupplier::new(dir.path().join("missing")).jwt().is_err());
    }
}
