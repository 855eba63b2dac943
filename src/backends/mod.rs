//! Secret backend integrations.
//!
//! Descriptors declare which backends are enabled, factories turn them into
//! [`SecretBackendMetadata`], and the registry keeps the factories in order.

mod descriptor;
mod factories;
mod metadata;
mod registry;

pub use descriptor::{BackendKind, SecretBackendDescriptor};
pub use factories::{builtin_factories, CredentialBackendFactory};
pub use metadata::{expand_template, PropertyTransformer, SecretBackendMetadata};
pub use registry::{resolve, Resolution, SecretBackendMetadataFactory, SecretBackendRegistry};
