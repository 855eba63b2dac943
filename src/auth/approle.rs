//! AppRole authentication.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AuthenticationMethod, ClientAuthentication, SecretString, VaultToken};
use crate::client::VaultClient;
use crate::errors::{Error, Result};

/// AppRole settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppRoleProperties {
    pub role_id: Option<String>,

    /// Optional when the role is configured without `bind_secret_id`
    pub secret_id: Option<SecretString>,

    /// Mount path of the AppRole auth backend
    pub path: String,
}

impl Default for AppRoleProperties {
    fn default() -> Self {
        Self { role_id: None, secret_id: None, path: "approle".to_string() }
    }
}

/// Logs in by posting `{role_id, secret_id}` to `auth/{path}/login`.
#[derive(Debug, Clone)]
pub struct AppRoleAuthentication {
    role_id: String,
    secret_id: Option<SecretString>,
    path: String,
    client: VaultClient,
}

impl AppRoleAuthentication {
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the role id is missing or empty
    pub fn new(properties: &AppRoleProperties, client: VaultClient) -> Result<Self> {
        let role_id = properties
            .role_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::configuration("RoleId (vault.app_role.role_id) must not be empty")
            })?;

        Ok(Self {
            role_id: role_id.to_string(),
            secret_id: properties.secret_id.clone().filter(|id| !id.is_empty()),
            path: properties.path.trim_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl ClientAuthentication for AppRoleAuthentication {
    fn method(&self) -> AuthenticationMethod {
        AuthenticationMethod::Approle
    }

    async fn login(&self) -> Result<VaultToken> {
        let body = match &self.secret_id {
            Some(secret_id) => {
                json!({ "role_id": self.role_id, "secret_id": secret_id.expose_secret() })
            }
            None => json!({ "role_id": self.role_id }),
        };

        self.client
            .login("AppRole", &format!("auth/{}/login", self.path), Some(&body), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientOptions;

    fn client() -> VaultClient {
        VaultClient::new(ClientOptions::default()).unwrap()
    }

    #[test]
    fn test_missing_role_id_fails_at_construction() {
        let err = AppRoleAuthentication::new(&AppRoleProperties::default(), client()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let properties = AppRoleProperties { role_id: Some(" ".into()), ..Default::default() };
        assert!(AppRoleAuthentication::new(&properties, client()).is_err());
    }

    #[test]
    fn test_blank_secret_id_is_dropped() {
        let properties = AppRoleProperties {
            role_id: Some("my-role".into()),
            secret_id: Some(SecretString::new("")),
            path: "/approle/".into(),
        };
        let auth = AppRoleAuthentication::new(&properties, client()).unwrap();
        assert!(auth.secret_id.is_none());
        assert_eq!(auth.path, "approle");
    }
}
