//! Secret path resolution.
//!
//! Turns application names and active profiles into the ordered list of generic
//! secret contexts to read. Earlier contexts take precedence in the composed
//! configuration, so the most specific ones come first.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::backends::{PropertyTransformer, SecretBackendMetadata};

/// Settings of the generic key/value backend.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GenericBackendProperties {
    pub enabled: bool,

    /// Mount path of the key/value backend
    #[validate(length(min = 1, message = "generic backend path must not be empty"))]
    pub backend: String,

    /// Context shared by all applications
    pub default_context: String,

    /// Separator between a context and a profile
    #[validate(length(min = 1, message = "profile separator must not be empty"))]
    pub profile_separator: String,

    /// One or more comma-separated application names
    pub application_name: String,
}

impl Default for GenericBackendProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: "secret".to_string(),
            default_context: "application".to_string(),
            profile_separator: "/".to_string(),
            application_name: String::new(),
        }
    }
}

impl GenericBackendProperties {
    /// Contexts for the configured application name and `profiles`.
    pub fn contexts(&self, profiles: &[String]) -> Vec<String> {
        build_contexts(
            &[self.application_name.as_str()],
            profiles,
            &self.default_context,
            &self.profile_separator,
        )
    }

    /// Metadata for every generic context, read from `{backend}/{context}`.
    ///
    /// Empty when the backend is disabled.
    pub fn metadata(&self, profiles: &[String]) -> Vec<SecretBackendMetadata> {
        if !self.enabled {
            return Vec::new();
        }

        let backend = self.backend.trim_matches('/');
        self.contexts(profiles)
            .into_iter()
            .map(|context| {
                let variables = BTreeMap::from([
                    ("backend".to_string(), backend.to_string()),
                    ("key".to_string(), context.clone()),
                ]);
                SecretBackendMetadata::new(
                    format!("{}/{}", backend, context),
                    PropertyTransformer::Noop,
                    variables,
                )
            })
            .collect()
    }
}

/// Order-preserving set that keeps the first occurrence of each entry.
#[derive(Default)]
struct ContextList {
    seen: HashSet<String>,
    entries: Vec<String>,
}

impl ContextList {
    fn push(&mut self, context: String) {
        if self.seen.insert(context.clone()) {
            self.entries.push(context);
        }
    }

    fn add_with_profiles(&mut self, context: &str, profiles: &[&str], separator: &str) {
        self.push(context.to_string());
        for profile in profiles {
            self.push(format!("{}{}{}", context, separator, profile));
        }
    }
}

/// Computes the generic secret contexts for `app_names` and `profiles`.
///
/// The default context and its profile variants are added first, then each
/// application name (comma-separated entries are split, empty ones skipped) with
/// its profile variants. Duplicates keep their first position. The list is then
/// reversed, so profile- and application-specific contexts come before the
/// default context. Among several application names, the last one declared ends
/// up first.
pub fn build_contexts<S: AsRef<str>>(
    app_names: &[S],
    profiles: &[String],
    default_context: &str,
    separator: &str,
) -> Vec<String> {
    let profiles: Vec<&str> =
        profiles.iter().map(|p| p.trim()).filter(|p| !p.is_empty()).collect();

    let mut contexts = ContextList::default();

    let default_context = default_context.trim();
    if !default_context.is_empty() {
        contexts.add_with_profiles(default_context, &profiles, separator);
    }

    let names = app_names
        .iter()
        .flat_map(|names| names.as_ref().split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty());
    for name in names {
        contexts.add_with_profiles(name, &profiles, separator);
    }

    let mut entries = contexts.entries;
    entries.reverse();
    entries
}
