//! # Structured Logging
//!
//! Span macros and helpers shared by the session, resolver and composer code.
//! Secret values never appear in fields; paths and lease metadata do.

/// Create a tracing span around one secret read.
///
/// ```rust,ignore
/// let span = secret_span!("secret/orders");
/// let span = secret_span!("mysql/creds/app", order = 2);
/// ```
#[macro_export]
macro_rules! secret_span {
    ($path:expr) => {
        tracing::debug_span!(
            "secret_read",
            path = %$path,
            read_id = %uuid::Uuid::new_v4()
        )
    };
    ($path:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "secret_read",
            path = %$path,
            read_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Log the effective configuration without credential material.
pub fn log_config_info(config: &crate::config::VaultConfig) {
    tracing::info!(
        address = %config.address,
        namespace = ?config.namespace,
        authentication = %config.authentication,
        generic_enabled = config.generic.enabled,
        generic_backend = %config.generic.backend,
        application_name = %config.generic.application_name,
        backends = config.backends.iter().filter(|b| b.enabled).count(),
        lifecycle_enabled = config.lifecycle.enabled,
        lease_refresh_enabled = config.lease_refresh.enabled,
        fail_fast = config.fail_fast,
        "vault-config configuration"
    );
}
