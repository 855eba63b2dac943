//! Integration tests for configuration management
//!
//! These tests validate that the configuration system reads `VAULT_*`
//! environment variables and configuration files.

use std::env;
use std::io::Write;
use std::sync::Mutex;

use vault_config::auth::AuthenticationMethod;
use vault_config::{Result, VaultConfig};

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARIABLES: &[&str] = &[
    "VAULT_ADDR",
    "VAULT_TOKEN",
    "VAULT_AUTHENTICATION",
    "VAULT_APP_ROLE_ROLE_ID",
    "VAULT_APPLICATION_NAME",
    "VAULT_GENERIC_DEFAULT_CONTEXT",
    "VAULT_LIFECYCLE_POLL_INTERVAL",
];

/// Saves the listed variables and restores them when dropped.
struct EnvSnapshot(Vec<(&'static str, Option<String>)>);

impl EnvSnapshot {
    fn take() -> Self {
        let saved = VARIABLES.iter().map(|name| (*name, env::var(name).ok())).collect();
        for name in VARIABLES {
            env::remove_var(name);
        }
        Self(saved)
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (name, value) in &self.0 {
            match value {
                Some(value) => env::set_var(name, value),
                None => env::remove_var(name),
            }
        }
    }
}

/// Test that configuration properly reads environment variables
#[test]
fn test_config_environment_integration() -> Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _snapshot = EnvSnapshot::take();

    env::set_var("VAULT_ADDR", "https://vault.internal:8200");
    env::set_var("VAULT_AUTHENTICATION", "approle");
    env::set_var("VAULT_APP_ROLE_ROLE_ID", "orders-role");
    env::set_var("VAULT_APPLICATION_NAME", "orders");

    let config = VaultConfig::from_env()?;
    assert_eq!(config.address, "https://vault.internal:8200");
    assert_eq!(config.authentication, AuthenticationMethod::Approle);
    assert_eq!(config.app_role.role_id.as_deref(), Some("orders-role"));
    assert_eq!(config.generic.application_name, "orders");
    assert_eq!(config.generic.default_context, "application");

    // An explicitly empty default context removes the shared context
    env::set_var("VAULT_GENERIC_DEFAULT_CONTEXT", "");
    let config = VaultConfig::from_env()?;
    assert_eq!(config.generic.default_context, "");

    // Test with invalid poll interval
    env::set_var("VAULT_LIFECYCLE_POLL_INTERVAL", "soon");
    assert!(VaultConfig::from_env().is_err());

    env::set_var("VAULT_LIFECYCLE_POLL_INTERVAL", "0");
    assert!(VaultConfig::from_env().is_err());

    Ok(())
}

/// Test that configuration defaults work when no environment variables are set
#[test]
fn test_config_defaults_integration() -> Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _snapshot = EnvSnapshot::take();

    let config = VaultConfig::from_env()?;
    assert_eq!(config.address, "http://127.0.0.1:8200");
    assert_eq!(config.authentication, AuthenticationMethod::Token);
    assert!(config.token.is_none());
    assert!(config.lifecycle.enabled);
    assert!(!config.lease_refresh.enabled);
    assert!(!config.fail_fast);

    Ok(())
}

#[test]
fn test_config_unknown_authentication_is_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _snapshot = EnvSnapshot::take();

    env::set_var("VAULT_AUTHENTICATION", "ldap");
    assert!(VaultConfig::from_env().is_err());
}

#[test]
fn test_config_file_integration() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
address: https://vault.example.com
authentication: kubernetes
kubernetes:
  role: orders
generic:
  application_name: orders
  profile_separator: ","
backends:
  - kind: postgresql
    enabled: true
    role: readonly
    order: 5
  - kind: rabbitmq
    role: publisher
"#
    )
    .unwrap();

    let config = VaultConfig::from_file(file.path())?;
    assert_eq!(config.authentication, AuthenticationMethod::Kubernetes);
    assert_eq!(config.kubernetes.role.as_deref(), Some("orders"));
    assert_eq!(config.generic.profile_separator, ",");
    assert_eq!(config.backends.len(), 2);
    assert!(config.backends[0].enabled);
    assert_eq!(config.backends[0].order, 5);
    // Descriptors are opt-in when declared in a file
    assert!(!config.backends[1].enabled);

    Ok(())
}

#[test]
fn test_config_file_missing_is_a_configuration_error() {
    let err = VaultConfig::from_file("/nonexistent/vault-config.yaml").unwrap_err();
    assert!(matches!(err, vault_config::Error::Configuration { .. }));
}
