//! AppId authentication and its user-id mechanisms.
//!
//! The user id is derived on every login: either a literal value, or a SHA-256
//! digest of the host's IP address or of a network interface's hardware address.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::warn;

use super::{AuthenticationMethod, ClientAuthentication, VaultToken};
use crate::client::VaultClient;
use crate::errors::{Error, Result};

pub const IP_ADDRESS: &str = "IP_ADDRESS";
pub const MAC_ADDRESS: &str = "MAC_ADDRESS";

/// AppId settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppIdProperties {
    /// Defaults to the configured application name
    pub app_id: Option<String>,

    /// Mount path of the AppId auth backend
    pub app_id_path: String,

    /// `IP_ADDRESS`, `MAC_ADDRESS`, or a literal user id
    pub user_id: String,

    /// Interface used by `MAC_ADDRESS`; first non-loopback interface when unset
    pub network_interface: Option<String>,
}

impl Default for AppIdProperties {
    fn default() -> Self {
        Self {
            app_id: None,
            app_id_path: "app-id".to_string(),
            user_id: MAC_ADDRESS.to_string(),
            network_interface: None,
        }
    }
}

/// Produces the `user_id` half of an AppId login.
pub trait AppIdUserIdMechanism: Send + Sync + std::fmt::Debug {
    fn create_user_id(&self) -> Result<String>;
}

/// A literal user id.
#[derive(Debug, Clone)]
pub struct StaticUserId(pub String);

impl AppIdUserIdMechanism for StaticUserId {
    fn create_user_id(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Hex SHA-256 of the host's primary IP address.
#[derive(Debug, Clone, Default)]
pub struct IpAddressUserId;

impl IpAddressUserId {
    fn local_address() -> IpAddr {
        // Connecting a UDP socket selects the outbound interface without sending anything.
        let detected = UdpSocket::bind("0.0.0.0:0")
            .and_then(|socket| socket.connect("192.0.2.1:9").map(|_| socket))
            .and_then(|socket| socket.local_addr());

        match detected {
            Ok(addr) => addr.ip(),
            Err(e) => {
                warn!(error = %e, "Cannot determine local IP address, using loopback");
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            }
        }
    }
}

impl AppIdUserIdMechanism for IpAddressUserId {
    fn create_user_id(&self) -> Result<String> {
        Ok(sha256_hex(&Self::local_address().to_string()))
    }
}

/// Hex SHA-256 of a network interface's hardware address, read from sysfs.
#[derive(Debug, Clone)]
pub struct MacAddressUserId {
    interface: Option<String>,
    sysfs_root: PathBuf,
}

impl MacAddressUserId {
    pub fn new(interface: Option<String>) -> Self {
        Self::with_sysfs_root(interface, "/sys/class/net")
    }

    pub fn with_sysfs_root(interface: Option<String>, root: impl Into<PathBuf>) -> Self {
        Self { interface: interface.filter(|name| !name.trim().is_empty()), sysfs_root: root.into() }
    }

    fn read_address(&self, interface: &str) -> Option<String> {
        let raw = std::fs::read_to_string(self.sysfs_root.join(interface).join("address")).ok()?;
        let hex: String = raw.trim().chars().filter(|c| *c != ':').collect::<String>().to_lowercase();
        if hex.is_empty() || hex.chars().all(|c| c == '0') {
            return None;
        }
        Some(hex)
    }

    fn hardware_address(&self) -> Result<String> {
        if let Some(interface) = &self.interface {
            return self.read_address(interface).ok_or_else(|| {
                Error::configuration(format!("Network interface '{}' has no hardware address", interface))
            });
        }

        let mut interfaces: Vec<String> = std::fs::read_dir(&self.sysfs_root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "lo")
            .collect();
        interfaces.sort();

        interfaces
            .iter()
            .find_map(|name| self.read_address(name))
            .ok_or_else(|| Error::configuration("No network interface with a hardware address found"))
    }
}

impl AppIdUserIdMechanism for MacAddressUserId {
    fn create_user_id(&self) -> Result<String> {
        Ok(sha256_hex(&self.hardware_address()?))
    }
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Selects the mechanism named by `properties.user_id`.
pub fn user_id_mechanism(properties: &AppIdProperties) -> Arc<dyn AppIdUserIdMechanism> {
    match properties.user_id.trim().to_ascii_uppercase().as_str() {
        IP_ADDRESS => Arc::new(IpAddressUserId),
        MAC_ADDRESS => Arc::new(MacAddressUserId::new(properties.network_interface.clone())),
        _ => Arc::new(StaticUserId(properties.user_id.trim().to_string())),
    }
}

/// Logs in by posting `{app_id, user_id}` to `auth/{app_id_path}/login`.
#[derive(Debug, Clone)]
pub struct AppIdAuthentication {
    app_id: String,
    path: String,
    user_id: Arc<dyn AppIdUserIdMechanism>,
    client: VaultClient,
}

impl AppIdAuthentication {
    /// # Errors
    ///
    /// - [`Error::Configuration`] if neither an app id nor an application name is set,
    ///   or the user id is empty
    pub fn new(
        properties: &AppIdProperties,
        application_name: &str,
        client: VaultClient,
    ) -> Result<Self> {
        let app_id = properties
            .app_id
            .as_deref()
            .unwrap_or(application_name)
            .trim()
            .to_string();
        if app_id.is_empty() {
            return Err(Error::configuration(
                "AppId (vault.app_id.app_id or application name) must not be empty",
            ));
        }
        if properties.user_id.trim().is_empty() {
            return Err(Error::configuration("UserId (vault.app_id.user_id) must not be empty"));
        }

        Ok(Self::with_mechanism(
            app_id,
            &properties.app_id_path,
            user_id_mechanism(properties),
            client,
        ))
    }

    pub fn with_mechanism(
        app_id: impl Into<String>,
        path: &str,
        user_id: Arc<dyn AppIdUserIdMechanism>,
        client: VaultClient,
    ) -> Self {
        Self { app_id: app_id.into(), path: path.trim_matches('/').to_string(), user_id, client }
    }
}

#[async_trait]
impl ClientAuthentication for AppIdAuthentication {
    fn method(&self) -> AuthenticationMethod {
        AuthenticationMethod::Appid
    }

    async fn login(&self) -> Result<VaultToken> {
        let body = json!({ "app_id": self.app_id, "user_id": self.user_id.create_user_id()? });

        self.client
            .login("AppId", &format!("auth/{}/login", self.path), Some(&body), None)
            .await
    }
}
