//! Property source composition.

use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};

use super::fetcher::PropertyFetcher;
use super::flatten::flatten;
use super::view::{ConfigView, PropertySource, SecretLease};
use crate::backends::SecretBackendMetadata;
use crate::errors::Result;

/// Builds a [`ConfigView`] from generic contexts and backend metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertySourceComposer {
    fail_fast: bool,
}

impl PropertySourceComposer {
    pub fn new(fail_fast: bool) -> Self {
        Self { fail_fast }
    }

    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Composition order: generic contexts as given, then backend metadata
    /// stable-sorted by `order`.
    pub fn entries(
        generic: Vec<SecretBackendMetadata>,
        mut backends: Vec<SecretBackendMetadata>,
    ) -> Vec<SecretBackendMetadata> {
        backends.sort_by_key(SecretBackendMetadata::order);
        let mut entries = generic;
        entries.extend(backends);
        entries
    }

    /// Fetches every entry and assembles the view.
    ///
    /// The fetcher is prepared once before any read, so a rejected login fails
    /// the whole cycle instead of being repeated per entry. Reads run
    /// concurrently; the view's order is always the entry order. A missing path
    /// contributes an empty source. Other failures abort the whole composition
    /// under fail-fast, dropping the reads still in flight; otherwise they are
    /// logged and the entry contributes an empty source. Configuration and
    /// validation errors always abort.
    pub async fn compose(
        &self,
        generic: Vec<SecretBackendMetadata>,
        backends: Vec<SecretBackendMetadata>,
        fetcher: &dyn PropertyFetcher,
    ) -> Result<ConfigView> {
        let entries = Self::entries(generic, backends);
        debug!(entries = entries.len(), fail_fast = self.fail_fast, "Composing property sources");

        if let Err(e) = fetcher.prepare().await {
            if self.fail_fast || e.is_fatal() {
                warn!(error = %e, "Cannot access secret store, aborting");
                return Err(e);
            }
            warn!(error = %e, entries = entries.len(), "Cannot access secret store, using empty sources");
            let sources = entries.iter().map(|entry| PropertySource::empty(entry.name())).collect();
            return Ok(ConfigView::new(sources));
        }

        let sources = try_join_all(entries.iter().map(|entry| self.load_source(entry, fetcher))).await?;

        let view = ConfigView::new(sources);
        info!(
            sources = view.len(),
            properties = view.property_names().len(),
            "Composed configuration"
        );
        Ok(view)
    }

    /// Applies the failure policy to one read.
    async fn load_source(
        &self,
        entry: &SecretBackendMetadata,
        fetcher: &dyn PropertyFetcher,
    ) -> Result<PropertySource> {
        match fetch_source(entry, fetcher).await {
            Ok(source) => Ok(source),
            Err(e) if self.fail_fast || e.is_fatal() => {
                warn!(path = entry.name(), error = %e, "Cannot load property source, aborting");
                Err(e)
            }
            Err(e) => {
                warn!(path = entry.name(), error = %e, "Cannot load property source, using empty source");
                Ok(PropertySource::empty(entry.name()))
            }
        }
    }
}

/// Reads one entry and applies its transformer.
pub(crate) async fn fetch_source(
    entry: &SecretBackendMetadata,
    fetcher: &dyn PropertyFetcher,
) -> Result<PropertySource> {
    let span = crate::secret_span!(entry.name(), order = entry.order());
    let Some(response) = fetcher.fetch(entry.name()).instrument(span).await? else {
        debug!(path = entry.name(), "Secret not found");
        return Ok(PropertySource::empty(entry.name()));
    };

    let properties = entry.transformer().transform(flatten(&response.data));
    let source = PropertySource::new(entry.name(), properties);

    Ok(match response.lease_id.filter(|id| !id.is_empty()) {
        Some(lease_id) if response.lease_duration > 0 => source.with_lease(SecretLease {
            lease_id,
            duration: Duration::from_secs(response.lease_duration),
            renewable: response.renewable,
            obtained_at: Instant::now(),
        }),
        _ => source,
    })
}
