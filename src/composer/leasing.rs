//! Background refresh of leased property sources.
//!
//! Dynamic credentials come with a lease. The refresher periodically re-reads
//! sources whose lease is about to run out and swaps the fresh map into the
//! shared view, leaving every other source untouched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::compose::fetch_source;
use super::fetcher::PropertyFetcher;
use super::view::{ConfigView, PropertySource};
use crate::backends::SecretBackendMetadata;
use crate::session::LifecycleOptions;

struct Refresher {
    view: Arc<RwLock<ConfigView>>,
    entries: Vec<SecretBackendMetadata>,
    fetcher: Arc<dyn PropertyFetcher>,
    threshold: f64,
    poll_interval: Duration,
}

impl Refresher {
    fn is_expiring(&self, source: &PropertySource) -> bool {
        source.lease().is_some_and(|lease| {
            let remaining = lease.remaining();
            remaining <= lease.duration.mul_f64(self.threshold) || remaining <= self.poll_interval
        })
    }

    async fn refresh_expiring(&self) -> usize {
        let expiring: Vec<String> = {
            let view = self.view.read().await;
            view.sources()
                .iter()
                .filter(|source| self.is_expiring(source))
                .map(|source| source.name().to_string())
                .collect()
        };

        let mut refreshed = 0;
        for name in expiring {
            let Some(entry) = self.entries.iter().find(|entry| entry.name() == name) else {
                continue;
            };
            match fetch_source(entry, self.fetcher.as_ref()).await {
                Ok(source) => {
                    if self.view.write().await.replace_source(source) {
                        debug!(path = %name, "Refreshed leased property source");
                        refreshed += 1;
                    }
                }
                Err(e) => warn!(path = %name, error = %e, "Cannot refresh leased property source"),
            }
        }
        refreshed
    }
}

/// Keeps leased sources of a shared [`ConfigView`] fresh.
pub struct LeaseRefresher {
    refresher: Arc<Refresher>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LeaseRefresher {
    /// Creates the refresher and, if `options.enabled`, spawns its polling task.
    ///
    /// `entries` are the metadata the view was composed from; sources without a
    /// matching entry are never refreshed.
    pub fn start(
        view: Arc<RwLock<ConfigView>>,
        entries: Vec<SecretBackendMetadata>,
        fetcher: Arc<dyn PropertyFetcher>,
        options: &LifecycleOptions,
    ) -> Self {
        let refresher = Arc::new(Refresher {
            view,
            entries,
            fetcher,
            threshold: options.expiry_threshold,
            poll_interval: options.poll_interval(),
        });
        let cancel = CancellationToken::new();

        let task = options.enabled.then(|| {
            info!(poll_interval_seconds = options.poll_interval_seconds, "Started lease refresh task");
            tokio::spawn(run_refresh(refresher.clone(), cancel.clone()))
        });

        Self { refresher, cancel, task }
    }

    /// Re-reads every expiring source now. Returns how many were replaced.
    pub async fn refresh_now(&self) -> usize {
        self.refresher.refresh_expiring().await
    }

    pub fn view(&self) -> Arc<RwLock<ConfigView>> {
        self.refresher.view.clone()
    }

    /// Stops the polling task and waits for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Lease refresh task ended abnormally");
            }
        }
    }
}

impl Drop for LeaseRefresher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_refresh(refresher: Arc<Refresher>, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + refresher.poll_interval, refresher.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                refresher.refresh_expiring().await;
            }
        }
    }
    debug!("Lease refresh task stopped");
}
