//! Backend accessor registry.
//!
//! Maps enabled descriptors to metadata through an ordered list of factories.
//! The first factory that supports a descriptor builds its metadata; a descriptor
//! no factory supports is logged and skipped so the others still resolve.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::descriptor::SecretBackendDescriptor;
use super::factories::builtin_factories;
use super::metadata::SecretBackendMetadata;
use crate::errors::Result;

/// Builds metadata for the descriptors it supports.
pub trait SecretBackendMetadataFactory: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn supports(&self, descriptor: &SecretBackendDescriptor) -> bool;

    /// # Errors
    ///
    /// - [`crate::errors::Error::Configuration`] if the descriptor lacks a required parameter
    fn build(&self, descriptor: &SecretBackendDescriptor) -> Result<SecretBackendMetadata>;
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Metadata in descriptor order
    pub metadata: Vec<SecretBackendMetadata>,
    /// Kinds of enabled descriptors no factory supports
    pub unsupported: Vec<String>,
}

/// Resolves every enabled descriptor with the first supporting factory.
///
/// # Errors
///
/// Fails only if a supporting factory rejects its descriptor.
pub fn resolve(
    descriptors: &[SecretBackendDescriptor],
    factories: &[Arc<dyn SecretBackendMetadataFactory>],
) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    for descriptor in descriptors.iter().filter(|d| d.enabled) {
        match factories.iter().find(|factory| factory.supports(descriptor)) {
            Some(factory) => {
                let metadata = factory.build(descriptor)?;
                debug!(
                    kind = %descriptor.kind,
                    factory = factory.name(),
                    path = metadata.name(),
                    "Resolved secret backend"
                );
                resolution.metadata.push(metadata);
            }
            None => {
                warn!(kind = %descriptor.kind, "Unsupported secret backend, skipping");
                resolution.unsupported.push(descriptor.kind.clone());
            }
        }
    }

    Ok(resolution)
}

/// Ordered set of factories.
#[derive(Clone, Default)]
pub struct SecretBackendRegistry {
    factories: Vec<Arc<dyn SecretBackendMetadataFactory>>,
}

impl std::fmt::Debug for SecretBackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBackendRegistry")
            .field("factories", &self.factories.iter().map(|f| f.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl SecretBackendRegistry {
    /// Create a registry with no factories
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the database, rabbitmq, consul and aws factories
    pub fn with_builtin_factories() -> Self {
        let mut registry = Self::new();
        for factory in builtin_factories() {
            registry.register(factory);
        }
        registry
    }

    /// Append a factory. Earlier registrations win.
    pub fn register(&mut self, factory: Arc<dyn SecretBackendMetadataFactory>) {
        info!(factory = factory.name(), "Registering secret backend factory");
        self.factories.push(factory);
    }

    pub fn factories(&self) -> &[Arc<dyn SecretBackendMetadataFactory>] {
        &self.factories
    }

    pub fn resolve(&self, descriptors: &[SecretBackendDescriptor]) -> Result<Resolution> {
        resolve(descriptors, &self.factories)
    }
}
