//! Built-in credential backend factories.
//!
//! Each factory serves one family of secrets engines that issue credentials for a
//! role. Metadata paths come from `{backend}/creds/{role}`, or
//! `{backend}/static-creds/{role}` for static database roles, and the returned
//! credential fields are renamed to property names.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::descriptor::{BackendKind, SecretBackendDescriptor};
use super::metadata::{expand_template, PropertyTransformer, SecretBackendMetadata};
use super::registry::SecretBackendMetadataFactory;
use crate::errors::{Error, Result};

const CREDS_TEMPLATE: &str = "{backend}/creds/{role}";
const STATIC_CREDS_TEMPLATE: &str = "{backend}/static-creds/{role}";

/// Factory for one family of credential backends.
#[derive(Debug, Clone)]
pub struct CredentialBackendFactory {
    name: &'static str,
    kinds: Vec<BackendKind>,
    fields: &'static [&'static str],
    static_roles: bool,
}

impl CredentialBackendFactory {
    /// `database`, `mysql`, `postgresql`, `cassandra`, `mongodb`, `elasticsearch`
    pub fn database() -> Self {
        Self {
            name: "database",
            kinds: BackendKind::ALL.into_iter().filter(BackendKind::is_database).collect(),
            fields: &["username", "password"],
            static_roles: true,
        }
    }

    pub fn rabbitmq() -> Self {
        Self {
            name: "rabbitmq",
            kinds: vec![BackendKind::Rabbitmq],
            fields: &["username", "password"],
            static_roles: false,
        }
    }

    pub fn consul() -> Self {
        Self { name: "consul", kinds: vec![BackendKind::Consul], fields: &["token"], static_roles: false }
    }

    pub fn aws() -> Self {
        Self {
            name: "aws",
            kinds: vec![BackendKind::Aws],
            fields: &["access_key", "secret_key", "security_token"],
            static_roles: false,
        }
    }

    /// Default property name for a credential field of `kind`.
    fn default_property(kind: BackendKind, field: &str) -> String {
        let prefix = match kind {
            BackendKind::Database | BackendKind::Mysql | BackendKind::Postgresql => "datasource",
            other => other.as_str(),
        };
        format!("{}.{}", prefix, field)
    }
}

impl SecretBackendMetadataFactory for CredentialBackendFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn supports(&self, descriptor: &SecretBackendDescriptor) -> bool {
        descriptor.builtin_kind().is_some_and(|kind| self.kinds.contains(&kind))
    }

    fn build(&self, descriptor: &SecretBackendDescriptor) -> Result<SecretBackendMetadata> {
        let kind = descriptor
            .builtin_kind()
            .ok_or_else(|| Error::configuration(format!("Unknown backend kind '{}'", descriptor.kind)))?;
        let role = descriptor.role().ok_or_else(|| {
            Error::configuration(format!("Role must not be empty for the {} backend", kind))
        })?;
        let backend = descriptor
            .backend
            .as_deref()
            .map(|b| b.trim_matches('/'))
            .filter(|b| !b.is_empty())
            .unwrap_or(kind.as_str());

        let template = if descriptor.static_role && self.static_roles {
            STATIC_CREDS_TEMPLATE
        } else {
            CREDS_TEMPLATE
        };

        let variables = BTreeMap::from([
            ("backend".to_string(), backend.to_string()),
            ("role".to_string(), role.to_string()),
        ]);

        let mut names: BTreeMap<String, String> = self
            .fields
            .iter()
            .map(|field| (field.to_string(), Self::default_property(kind, field)))
            .collect();
        names.extend(descriptor.property_names.clone());

        Ok(SecretBackendMetadata::new(
            expand_template(template, &variables),
            PropertyTransformer::Rename(names),
            variables,
        )
        .with_order(descriptor.order))
    }
}

/// The built-in factories in registration order.
pub fn builtin_factories() -> Vec<Arc<dyn SecretBackendMetadataFactory>> {
    vec![
        Arc::new(CredentialBackendFactory::database()),
        Arc::new(CredentialBackendFactory::rabbitmq()),
        Arc::new(CredentialBackendFactory::consul()),
        Arc::new(CredentialBackendFactory::aws()),
    ]
}
