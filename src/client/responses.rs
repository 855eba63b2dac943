//! Response bodies of the secret store's HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope returned by login, read and unwrap calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultResponse {
    #[serde(default)]
    pub auth: Option<AuthInfo>,

    #[serde(default)]
    pub data: Option<Map<String, Value>>,

    #[serde(default)]
    pub lease_id: Option<String>,

    #[serde(default)]
    pub lease_duration: Option<u64>,

    #[serde(default)]
    pub renewable: Option<bool>,

    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// The `auth` block of a login or renewal response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthInfo {
    pub client_token: Option<String>,

    #[serde(default)]
    pub accessor: Option<String>,

    #[serde(default)]
    pub policies: Vec<String>,

    pub renewable: Option<bool>,

    pub lease_duration: Option<u64>,
}

/// Error body: `{"errors": ["..."]}`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ErrorResponse {
    /// Best-effort extraction of the store's error messages from a raw body.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join(", "),
            _ if body.trim().is_empty() => "no response body".to_string(),
            _ => body.trim().to_string(),
        }
    }
}

/// Body of `GET sys/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultHealth {
    pub initialized: bool,
    pub sealed: bool,
    pub standby: bool,

    #[serde(default)]
    pub version: Option<String>,
}

/// Secret data and lease information from a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretResponse {
    pub data: Map<String, Value>,
    pub lease_id: Option<String>,
    pub lease_duration: u64,
    pub renewable: bool,
}

impl From<VaultResponse> for SecretResponse {
    fn from(response: VaultResponse) -> Self {
        Self {
            data: response.data.unwrap_or_default(),
            lease_id: response.lease_id.filter(|id| !id.is_empty()),
            lease_duration: response.lease_duration.unwrap_or(0),
            renewable: response.renewable.unwrap_or(false),
        }
    }
}
