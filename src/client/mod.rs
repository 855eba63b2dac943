//! HTTP client for the secret store.
//!
//! Thin wrapper over `reqwest` that knows the store's URL layout (`/v1/...`),
//! the `X-Vault-Token`/`X-Vault-Namespace` headers and the error envelope.
//! Authentication strategies, the session managers and the property fetcher
//! all go through [`VaultClient`]; none of them build requests themselves.

mod responses;

pub use responses::{AuthInfo, ErrorResponse, SecretResponse, VaultHealth, VaultResponse};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::auth::VaultToken;
use crate::errors::{Error, Result};
use crate::session::TokenOperations;

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";
const HEALTH_PATH: &str = "sys/health";

/// Connection settings for [`VaultClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base address, e.g. `https://vault.example.com:8200`
    pub address: String,
    /// Enterprise namespace sent with every request
    pub namespace: Option<String>,
    pub connection_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            namespace: None,
            connection_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(15),
        }
    }
}

/// Client for the secret store's HTTP API. Cheap to clone.
#[derive(Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    base: Url,
    namespace: Option<String>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base", &self.base.as_str())
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl VaultClient {
    /// Creates a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the address is not an absolute http(s) URL
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(options.connection_timeout)
            .timeout(options.read_timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Cannot build HTTP client: {}", e)))?;

        Self::with_http_client(&options.address, options.namespace, http)
    }

    /// Creates a client on top of a preconfigured `reqwest::Client`.
    ///
    /// Client-certificate authentication relies on this: the TLS identity lives on
    /// the transport, not in the login request.
    pub fn with_http_client(
        address: &str,
        namespace: Option<String>,
        http: reqwest::Client,
    ) -> Result<Self> {
        let mut base = Url::parse(address).map_err(|e| {
            Error::configuration(format!("Invalid secret store address '{}': {}", address, e))
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "Secret store address must use http or https, got '{}'",
                base.scheme()
            )));
        }

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let base = base
            .join("v1/")
            .map_err(|e| Error::configuration(format!("Invalid secret store address: {}", e)))?;

        Ok(Self { http, base, namespace: namespace.filter(|ns| !ns.is_empty()) })
    }

    /// Absolute URL for an API path such as `auth/approle/login`.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::validation(format!("Invalid secret path '{}': {}", path, e)))
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder> {
        let mut request = self.http.request(method, self.url(path)?);
        if let Some(namespace) = &self.namespace {
            request = request.header(NAMESPACE_HEADER, namespace);
        }
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }
        Ok(request)
    }

    /// Performs a login call and derives a [`VaultToken`] from its `auth` block.
    ///
    /// `method` only names the scheme in error messages. `wrapping_token` is sent as
    /// `X-Vault-Token` for calls that are themselves authenticated (unwrap).
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] for non-success statuses or a missing `auth` block
    /// - [`Error::Transport`] if the store cannot be reached
    pub async fn login<B: Serialize + ?Sized>(
        &self,
        method: &str,
        path: &str,
        body: Option<&B>,
        wrapping_token: Option<&str>,
    ) -> Result<VaultToken> {
        let mut request = self.request(Method::POST, path, wrapping_token)?;
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = ErrorResponse::message_from(&response.text().await.unwrap_or_default());
            warn!(method = %method, path = %path, status = status.as_u16(), "Login rejected");
            return Err(Error::authentication(format!(
                "Cannot login using {}: {}",
                method, message
            )));
        }

        let body: VaultResponse = response.json().await.map_err(|e| {
            Error::authentication(format!("Cannot login using {}: malformed response: {}", method, e))
        })?;
        let auth = body.auth.ok_or_else(|| {
            Error::authentication(format!("Cannot login using {}: response has no auth block", method))
        })?;

        let token = VaultToken::from_auth(&auth)?;
        debug!(
            method = %method,
            renewable = token.is_renewable(),
            lease_seconds = token.lease_duration().as_secs(),
            "Login succeeded"
        );
        Ok(token)
    }

    /// Reads a secret. A missing path yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] on 401/403
    /// - [`Error::Backend`] on any other non-success status
    /// - [`Error::Transport`] if the store cannot be reached
    pub async fn read(&self, path: &str, token: &VaultToken) -> Result<Option<SecretResponse>> {
        let response = self.request(Method::GET, path, Some(token.token()))?.send().await?;
        Self::secret_from(path, response).await
    }

    /// Writes a secret. Used by setup tooling and tests; configuration loading
    /// never writes.
    pub async fn write<B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &VaultToken,
        body: &B,
    ) -> Result<Option<SecretResponse>> {
        let response =
            self.request(Method::POST, path, Some(token.token()))?.json(body).send().await?;
        Self::secret_from(path, response).await
    }

    async fn secret_from(path: &str, response: Response) -> Result<Option<SecretResponse>> {
        let status = response.status();
        match status {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let message = ErrorResponse::message_from(&response.text().await.unwrap_or_default());
                Err(Error::authentication(format!("Access to '{}' denied: {}", path, message)))
            }
            status if status.is_success() => {
                let body: VaultResponse = response.json().await.map_err(|e| {
                    Error::backend(path, status.as_u16(), format!("malformed response: {}", e))
                })?;
                Ok(Some(SecretResponse::from(body)))
            }
            status => {
                let message = ErrorResponse::message_from(&response.text().await.unwrap_or_default());
                Err(Error::backend(path, status.as_u16(), message))
            }
        }
    }

    /// Fetches a document from an absolute URL outside the store's API, such as
    /// the instance identity endpoint of a cloud metadata service.
    pub async fn fetch_external(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(format!("GET {} returned {}", url, status.as_u16())));
        }
        Ok(response.text().await?)
    }

    /// Queries `sys/health`. The store answers with non-200 codes for sealed or
    /// standby nodes, so the body is parsed regardless of status.
    pub async fn health(&self) -> Result<VaultHealth> {
        let response = self.request(Method::GET, HEALTH_PATH, None)?.send().await?;
        let status = response.status();
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            Error::backend(HEALTH_PATH, status.as_u16(), format!("malformed health response: {}", e))
        })
    }
}

#[async_trait]
impl TokenOperations for VaultClient {
    async fn renew_self(&self, token: &VaultToken) -> Result<VaultToken> {
        let response = self
            .request(Method::POST, "auth/token/renew-self", Some(token.token()))?
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = ErrorResponse::message_from(&response.text().await.unwrap_or_default());
            return Err(Error::authentication(format!("Cannot renew token: {}", message)));
        }

        let body: VaultResponse = response.json().await?;
        let auth = body
            .auth
            .ok_or_else(|| Error::authentication("Cannot renew token: response has no auth block"))?;

        let lease = Duration::from_secs(auth.lease_duration.unwrap_or(0));
        Ok(token.with_lease(lease, auth.renewable.unwrap_or(false)))
    }

    async fn revoke_self(&self, token: &VaultToken) -> Result<()> {
        let response = self
            .request(Method::POST, "auth/token/revoke-self", Some(token.token()))?
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = ErrorResponse::message_from(&response.text().await.unwrap_or_default());
            return Err(Error::authentication(format!("Cannot revoke token: {}", message)));
        }
        Ok(())
    }
}
