//! src/services/collection_service.rs
//!
//! CollectionService: runs one Account Collector per configured account,
//! waits for all of them, and merges their records into a snapshot where each
//! bucket name appears once (the account dispatched first wins).

use crate::{
    models::{account::AccountCredential, snapshot::CollectionSnapshot},
    services::{account_collector::AccountCollector, gateway::GatewayConnector, prober::Prober},
};
use futures::future::join_all;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Outcome of one scrape over the configured accounts.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub snapshot: CollectionSnapshot,
    pub duration: Duration,
    pub accounts: usize,
}

/// Shared, cheaply cloneable handle used as HTTP state.
#[derive(Clone)]
pub struct CollectionService {
    accounts: Arc<Vec<AccountCredential>>,
    collector: AccountCollector,
    // Every pass writes to the same probe key, so passes must not overlap.
    pass_lock: Arc<Mutex<()>>,
}

impl CollectionService {
    pub fn new(
        connector: Arc<dyn GatewayConnector>,
        accounts: Vec<AccountCredential>,
        prober: Prober,
        probe_concurrency: usize,
    ) -> Self {
        Self {
            accounts: Arc::new(accounts),
            collector: AccountCollector::new(connector, prober, probe_concurrency),
            pass_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Accounts scraped by [`CollectionService::scrape`].
    pub fn accounts(&self) -> &[AccountCredential] {
        &self.accounts
    }

    /// Collect every bucket of every account in `credentials`.
    ///
    /// Accounts are collected concurrently without a limit. Partial failures
    /// only shrink the snapshot; nothing here returns an error. Concurrent
    /// callers are served one pass at a time, so one pass never overwrites the
    /// probe object another pass is about to read back.
    pub async fn collect_all(&self, credentials: &[AccountCredential]) -> CollectionSnapshot {
        if credentials.is_empty() {
            warn!("no accounts configured, returning an empty snapshot");
            return CollectionSnapshot::empty();
        }

        let _pass = self.pass_lock.lock().await;

        // Each collect runs its pass on its own task; join_all keeps dispatch
        // order, which makes the deduplication below deterministic.
        let passes = credentials
            .iter()
            .cloned()
            .map(|credential| self.collector.collect(credential));
        let records: Vec<_> = join_all(passes).await.into_iter().flatten().collect();

        let reported = records.len();
        let snapshot = CollectionSnapshot::from_ordered(records);
        if snapshot.len() < reported {
            debug!(
                "discarded {} duplicate bucket records",
                reported - snapshot.len()
            );
        }

        snapshot
    }

    /// Collect over the configured accounts and time the run.
    pub async fn scrape(&self) -> ScrapeReport {
        let started = Instant::now();
        let snapshot = self.collect_all(&self.accounts).await;
        let duration = started.elapsed();

        info!(
            "collected {} buckets from {} accounts in {:?} (probe limit {})",
            snapshot.len(),
            self.accounts.len(),
            duration,
            self.collector.concurrency()
        );
        if snapshot.is_empty() && !self.accounts.is_empty() {
            warn!("scrape produced no bucket records");
        }

        ScrapeReport {
            snapshot,
            duration,
            accounts: self.accounts.len(),
        }
    }
}
