//! Secret backend descriptors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Backend kinds the built-in factories know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Generic database secrets engine
    Database,
    Mysql,
    Postgresql,
    Cassandra,
    Mongodb,
    Elasticsearch,
    Rabbitmq,
    Consul,
    Aws,
}

impl BackendKind {
    pub const ALL: [BackendKind; 9] = [
        Self::Database,
        Self::Mysql,
        Self::Postgresql,
        Self::Cassandra,
        Self::Mongodb,
        Self::Elasticsearch,
        Self::Rabbitmq,
        Self::Consul,
        Self::Aws,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
            Self::Cassandra => "cassandra",
            Self::Mongodb => "mongodb",
            Self::Elasticsearch => "elasticsearch",
            Self::Rabbitmq => "rabbitmq",
            Self::Consul => "consul",
            Self::Aws => "aws",
        }
    }

    /// Kinds served by the database secrets engine.
    pub fn is_database(&self) -> bool {
        !matches!(self, Self::Rabbitmq | Self::Consul | Self::Aws)
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown secret backend kind: {}", s))
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declares one secret backend integration.
///
/// `kind` is free-form so that custom factories can claim kinds the built-in
/// ones do not know. Disabled descriptors never produce metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretBackendDescriptor {
    pub kind: String,

    pub enabled: bool,

    /// Mount path; defaults to the kind's conventional mount
    pub backend: Option<String>,

    /// Role to request credentials for
    pub role: Option<String>,

    /// Read `static-creds` instead of `creds` (database kinds only)
    pub static_role: bool,

    /// Position among backend property sources; lower comes first
    pub order: i32,

    /// Overrides of credential field to property name, e.g. `username: db.user`
    pub property_names: BTreeMap<String, String>,
}

impl SecretBackendDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), enabled: true, ..Default::default() }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The built-in kind, if `kind` names one.
    pub fn builtin_kind(&self) -> Option<BackendKind> {
        self.kind.parse().ok()
    }

    /// Trimmed, non-empty role.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().map(str::trim).filter(|role| !role.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("MySQL".parse::<BackendKind>(), Ok(BackendKind::Mysql));
        assert!("ldap".parse::<BackendKind>().is_err());
        assert!(BackendKind::Postgresql.is_database());
        assert!(!BackendKind::Consul.is_database());
    }

    #[test]
    fn test_descriptor_from_yaml() {
        let yaml = r#"
kind: postgresql
enabled: true
role: readonly
order: 5
property_names:
  username: db.user
"#;
        let descriptor: SecretBackendDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(descriptor.builtin_kind(), Some(BackendKind::Postgresql));
        assert_eq!(descriptor.role(), Some("readonly"));
        assert_eq!(descriptor.order, 5);
        assert!(!descriptor.static_role);
        assert_eq!(descriptor.property_names.get("username").map(String::as_str), Some("db.user"));
    }

    #[test]
    fn test_descriptors_are_disabled_unless_declared() {
        let descriptor: SecretBackendDescriptor = serde_yaml::from_str("kind: consul").unwrap();
        assert!(!descriptor.enabled);
        assert!(SecretBackendDescriptor::new("consul").enabled);
    }
}
