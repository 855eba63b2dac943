//! Composed configuration view.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Lease attached to a secret read, such as dynamic database credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretLease {
    pub lease_id: String,
    pub duration: Duration,
    pub renewable: bool,
    pub obtained_at: Instant,
}

impl SecretLease {
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.obtained_at.elapsed())
    }
}

/// One named key/value map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    name: String,
    properties: BTreeMap<String, String>,
    lease: Option<SecretLease>,
}

impl PropertySource {
    pub fn new(name: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self { name: name.into(), properties, lease: None }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, BTreeMap::new())
    }

    pub fn with_lease(mut self, lease: SecretLease) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn lease(&self) -> Option<&SecretLease> {
        self.lease.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Ordered sequence of property sources. For a key present in several
/// sources, the earliest source wins.
#[derive(Debug, Clone)]
pub struct ConfigView {
    sources: Vec<PropertySource>,
    composed_at: DateTime<Utc>,
}

impl ConfigView {
    pub fn new(sources: Vec<PropertySource>) -> Self {
        Self { sources, composed_at: Utc::now() }
    }

    pub fn sources(&self) -> &[PropertySource] {
        &self.sources
    }

    pub fn source(&self, name: &str) -> Option<&PropertySource> {
        self.sources.iter().find(|source| source.name == name)
    }

    pub fn composed_at(&self) -> DateTime<Utc> {
        self.composed_at
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.sources.iter().find_map(|source| source.get(key))
    }

    /// The name of the source that supplies `key`.
    pub fn origin(&self, key: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|source| source.properties.contains_key(key))
            .map(PropertySource::name)
    }

    /// All properties flattened into one map with precedence applied.
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for source in &self.sources {
            for (key, value) in &source.properties {
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        merged
    }

    pub fn property_names(&self) -> Vec<String> {
        self.merged().into_keys().collect()
    }

    /// Replaces the source with the same name in place, keeping its position.
    /// Returns `false` if no such source exists.
    pub fn replace_source(&mut self, source: PropertySource) -> bool {
        match self.sources.iter_mut().find(|existing| existing.name == source.name) {
            Some(existing) => {
                *existing = source;
                true
            }
            None => false,
        }
    }
}
