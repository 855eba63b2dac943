//! # Configuration
//!
//! [`VaultConfig`] gathers everything needed to authenticate, resolve contexts
//! and compose property sources. It can be read from a YAML/JSON file or from
//! `VAULT_*` environment variables and is validated with the `validator` crate
//! plus checks the derive cannot express.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use validator::Validate;

use crate::auth::{
    AppIdProperties, AppRoleProperties, AuthenticationMethod, AwsEc2Properties, CertProperties,
    KubernetesProperties, SecretString,
};
use crate::backends::SecretBackendDescriptor;
use crate::client::ClientOptions;
use crate::errors::{Error, Result};
use crate::resolver::GenericBackendProperties;
use crate::session::LifecycleOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct VaultConfig {
    /// Secret store address
    #[validate(length(min = 1, message = "Address cannot be empty"))]
    pub address: String,

    /// Enterprise namespace
    pub namespace: Option<String>,

    #[validate(range(min = 1, max = 300, message = "Connection timeout must be between 1 and 300 seconds"))]
    pub connection_timeout_seconds: u64,

    #[validate(range(min = 1, max = 300, message = "Read timeout must be between 1 and 300 seconds"))]
    pub read_timeout_seconds: u64,

    /// Active authentication scheme
    pub authentication: AuthenticationMethod,

    /// Static token, or the wrapping token for cubbyhole authentication
    pub token: Option<SecretString>,

    pub app_role: AppRoleProperties,
    pub app_id: AppIdProperties,
    pub aws_ec2: AwsEc2Properties,
    pub kubernetes: KubernetesProperties,
    pub cert: CertProperties,

    #[validate(nested)]
    pub generic: GenericBackendProperties,

    /// Credential backends, resolved through the backend registry
    pub backends: Vec<SecretBackendDescriptor>,

    /// Session token renewal
    #[validate(nested)]
    pub lifecycle: LifecycleOptions,

    /// Refresh of leased property sources; off unless enabled
    #[validate(nested)]
    pub lease_refresh: LifecycleOptions,

    /// Abort composition on the first authentication or transport failure
    pub fail_fast: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            namespace: None,
            connection_timeout_seconds: 5,
            read_timeout_seconds: 15,
            authentication: AuthenticationMethod::Token,
            token: None,
            app_role: AppRoleProperties::default(),
            app_id: AppIdProperties::default(),
            aws_ec2: AwsEc2Properties::default(),
            kubernetes: KubernetesProperties::default(),
            cert: CertProperties::default(),
            generic: GenericBackendProperties::default(),
            backends: Vec::new(),
            lifecycle: LifecycleOptions::default(),
            lease_refresh: LifecycleOptions { enabled: false, ..Default::default() },
            fail_fast: false,
        }
    }
}

impl VaultConfig {
    /// Parse a YAML document (JSON is accepted too).
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("Cannot read configuration file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_yaml_str(&contents)
    }

    /// Build the configuration from `VAULT_*` environment variables.
    ///
    /// Backend descriptors can only be declared in a file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(address) = var("VAULT_ADDR") {
            config.address = address;
        }
        config.namespace = var("VAULT_NAMESPACE");
        config.token = var("VAULT_TOKEN").map(SecretString::from);
        if let Some(method) = var("VAULT_AUTHENTICATION") {
            config.authentication = method.parse().map_err(Error::configuration)?;
        }
        if let Some(seconds) = var("VAULT_CONNECTION_TIMEOUT") {
            config.connection_timeout_seconds = parse("VAULT_CONNECTION_TIMEOUT", &seconds)?;
        }
        if let Some(seconds) = var("VAULT_READ_TIMEOUT") {
            config.read_timeout_seconds = parse("VAULT_READ_TIMEOUT", &seconds)?;
        }
        if let Some(fail_fast) = var("VAULT_FAIL_FAST") {
            config.fail_fast = parse("VAULT_FAIL_FAST", &fail_fast)?;
        }

        config.app_role.role_id = var("VAULT_APP_ROLE_ROLE_ID");
        config.app_role.secret_id = var("VAULT_APP_ROLE_SECRET_ID").map(SecretString::from);
        if let Some(path) = var("VAULT_APP_ROLE_PATH") {
            config.app_role.path = path;
        }

        config.app_id.app_id = var("VAULT_APP_ID");
        if let Some(path) = var("VAULT_APP_ID_PATH") {
            config.app_id.app_id_path = path;
        }
        if let Some(user_id) = var("VAULT_APP_ID_USER_ID") {
            config.app_id.user_id = user_id;
        }
        config.app_id.network_interface = var("VAULT_APP_ID_NETWORK_INTERFACE");

        config.aws_ec2.role = var("VAULT_AWS_EC2_ROLE");
        if let Some(path) = var("VAULT_AWS_EC2_PATH") {
            config.aws_ec2.path = path;
        }
        if let Some(url) = var("VAULT_AWS_EC2_IDENTITY_DOCUMENT") {
            config.aws_ec2.identity_document = url;
        }

        config.kubernetes.role = var("VAULT_KUBERNETES_ROLE");
        if let Some(path) = var("VAULT_KUBERNETES_PATH") {
            config.kubernetes.path = path;
        }
        if let Some(file) = var("VAULT_KUBERNETES_TOKEN_FILE") {
            config.kubernetes.service_account_token_file = file.into();
        }

        if let Some(path) = var("VAULT_CERT_PATH") {
            config.cert.path = path;
        }

        if let Some(enabled) = var("VAULT_GENERIC_ENABLED") {
            config.generic.enabled = parse("VAULT_GENERIC_ENABLED", &enabled)?;
        }
        if let Some(backend) = var("VAULT_GENERIC_BACKEND") {
            config.generic.backend = backend;
        }
        if let Some(context) = lookup("VAULT_GENERIC_DEFAULT_CONTEXT") {
            // An explicitly empty default context disables the shared context.
            config.generic.default_context = context.trim().to_string();
        }
        if let Some(separator) = var("VAULT_GENERIC_PROFILE_SEPARATOR") {
            config.generic.profile_separator = separator;
        }
        if let Some(name) = var("VAULT_APPLICATION_NAME") {
            config.generic.application_name = name;
        }

        if let Some(enabled) = var("VAULT_LIFECYCLE_ENABLED") {
            config.lifecycle.enabled = parse("VAULT_LIFECYCLE_ENABLED", &enabled)?;
        }
        if let Some(seconds) = var("VAULT_LIFECYCLE_POLL_INTERVAL") {
            config.lifecycle.poll_interval_seconds = parse("VAULT_LIFECYCLE_POLL_INTERVAL", &seconds)?;
        }
        if let Some(threshold) = var("VAULT_LIFECYCLE_EXPIRY_THRESHOLD") {
            config.lifecycle.expiry_threshold = parse("VAULT_LIFECYCLE_EXPIRY_THRESHOLD", &threshold)?;
        }
        if let Some(enabled) = var("VAULT_LEASE_REFRESH_ENABLED") {
            config.lease_refresh.enabled = parse("VAULT_LEASE_REFRESH_ENABLED", &enabled)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        let address = Url::parse(&self.address).map_err(|e| {
            Error::configuration(format!("Invalid secret store address '{}': {}", self.address, e))
        })?;
        if !matches!(address.scheme(), "http" | "https") {
            return Err(Error::configuration("Secret store address must use http or https"));
        }

        for (index, descriptor) in self.backends.iter().enumerate() {
            if descriptor.kind.trim().is_empty() {
                return Err(Error::configuration(format!("backends[{}].kind must not be empty", index)));
            }
        }

        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            address: self.address.clone(),
            namespace: self.namespace.clone(),
            connection_timeout: Duration::from_secs(self.connection_timeout_seconds),
            read_timeout: Duration::from_secs(self.read_timeout_seconds),
        }
    }
}

fn parse<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::configuration(format!("Invalid value for {}: {}", name, e)))
}
