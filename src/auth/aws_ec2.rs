//! AWS EC2 instance identity authentication.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::{AuthenticationMethod, ClientAuthentication, VaultToken};
use crate::client::VaultClient;
use crate::errors::{Error, Result};

pub const DEFAULT_IDENTITY_DOCUMENT: &str =
    "http://169.254.169.254/latest/dynamic/instance-identity/pkcs7";

/// AWS EC2 settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsEc2Properties {
    /// Role to log in as; the store picks one from the AMI when unset
    pub role: Option<String>,

    /// Mount path of the aws-ec2 auth backend
    pub path: String,

    /// URL of the PKCS#7 signed instance identity document
    pub identity_document: String,
}

impl Default for AwsEc2Properties {
    fn default() -> Self {
        Self {
            role: None,
            path: "aws-ec2".to_string(),
            identity_document: DEFAULT_IDENTITY_DOCUMENT.to_string(),
        }
    }
}

/// Logs in with the instance's signed identity document.
///
/// A nonce is generated once per instance of this type and sent with every login,
/// so re-authentication from the same process is accepted by the store.
#[derive(Debug, Clone)]
pub struct AwsEc2Authentication {
    role: Option<String>,
    path: String,
    identity_document: String,
    nonce: String,
    client: VaultClient,
}

impl AwsEc2Authentication {
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the identity document URL is empty
    pub fn new(properties: &AwsEc2Properties, client: VaultClient) -> Result<Self> {
        let identity_document = properties.identity_document.trim();
        if identity_document.is_empty() {
            return Err(Error::configuration(
                "Identity document URL (vault.aws_ec2.identity_document) must not be empty",
            ));
        }

        Ok(Self {
            role: properties.role.as_deref().map(str::trim).filter(|r| !r.is_empty()).map(String::from),
            path: properties.path.trim_matches('/').to_string(),
            identity_document: identity_document.to_string(),
            nonce: Uuid::new_v4().to_string(),
            client,
        })
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    async fn login_body(&self) -> Result<Map<String, Value>> {
        let document = self.client.fetch_external(&self.identity_document).await.map_err(|e| {
            Error::authentication(format!("Cannot obtain Identity Document: {}", e))
        })?;
        let pkcs7: String = document.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        debug!(bytes = pkcs7.len(), "Fetched instance identity document");

        let mut body = Map::new();
        if let Some(role) = &self.role {
            body.insert("role".to_string(), Value::String(role.clone()));
        }
        body.insert("pkcs7".to_string(), Value::String(pkcs7));
        body.insert("nonce".to_string(), Value::String(self.nonce.clone()));
        Ok(body)
    }
}

#[async_trait]
impl ClientAuthentication for AwsEc2Authentication {
    fn method(&self) -> AuthenticationMethod {
        AuthenticationMethod::AwsEc2
    }

    async fn login(&self) -> Result<VaultToken> {
        let body = self.login_body().await?;
        self.client
            .login("AWS-EC2", &format!("auth/{}/login", self.path), Some(&body), None)
            .await
    }
}
