//! src/services/account_collector.rs
//!
//! Account Collector: lists the buckets of one account and probes each of them
//! in its own task. A per-account semaphore bounds how many probes talk to the
//! remote service at once; the collector waits for every task before returning.

use crate::{
    models::{
        account::AccountCredential,
        bucket::{BucketEntry, BucketStatus},
    },
    services::{
        gateway::{GatewayConnector, GatewayLease},
        prober::{ProbeFault, Prober},
    },
};
use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::{debug, info, warn};

pub const DEFAULT_PROBE_CONCURRENCY: usize = 30;

#[derive(Clone)]
pub struct AccountCollector {
    connector: Arc<dyn GatewayConnector>,
    prober: Arc<Prober>,
    concurrency: usize,
}

impl AccountCollector {
    pub fn new(connector: Arc<dyn GatewayConnector>, prober: Prober, concurrency: usize) -> Self {
        Self {
            connector,
            prober: Arc::new(prober),
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Collect all buckets of one account.
    ///
    /// Never fails: a connect or list error, or a panic anywhere in the pass,
    /// yields an empty result for this account.
    pub async fn collect(&self, credential: AccountCredential) -> Vec<BucketStatus> {
        let account = credential.label();
        let collector = self.clone();
        let pass = tokio::spawn(async move { collector.collect_pass(&credential).await });

        match pass.await {
            Ok(statuses) => statuses,
            Err(err) => {
                warn!("collection of account {} aborted: {}", account, err);
                Vec::new()
            }
        }
    }

    async fn collect_pass(&self, credential: &AccountCredential) -> Vec<BucketStatus> {
        let account = credential.label();

        let lease = match GatewayLease::acquire(self.connector.as_ref(), credential) {
            Ok(lease) => lease,
            Err(err) => {
                warn!("skipping account {}: {}", account, err);
                return Vec::new();
            }
        };

        let buckets = match lease.list_buckets().await {
            Ok(buckets) => buckets,
            Err(err) => {
                warn!("listing buckets of account {} failed: {}", account, err);
                return Vec::new();
            }
        };

        let listed = buckets.len();
        let statuses = self.probe_all(&lease, buckets).await;
        info!(
            "account {} reported {} of {} buckets",
            account,
            statuses.len(),
            listed
        );

        statuses
    }

    /// Fan out one task per bucket and fan the results back in, in listing order.
    async fn probe_all(&self, lease: &GatewayLease, buckets: Vec<BucketEntry>) -> Vec<BucketStatus> {
        let gate = Arc::new(Semaphore::new(self.concurrency));

        let handles: Vec<(String, JoinHandle<Result<BucketStatus, ProbeFault>>)> = buckets
            .into_iter()
            .map(|entry| {
                let gate = Arc::clone(&gate);
                let gateway = lease.handle();
                let prober = Arc::clone(&self.prober);
                let bucket = entry.name.clone();

                let handle = tokio::spawn(async move {
                    // The gate belongs to this pass and is never closed, so
                    // acquiring can only wait.
                    let _permit = gate.acquire_owned().await.ok();
                    prober.probe(gateway.as_ref(), &entry.name).await
                });

                (bucket, handle)
            })
            .collect();

        let mut statuses = Vec::with_capacity(handles.len());
        for (bucket, handle) in handles {
            let outcome = handle
                .await
                .unwrap_or_else(|err| Err(ProbeFault::Panicked(err.to_string())));

            match outcome {
                Ok(status) => {
                    debug!(
                        "bucket {}: {} bytes, {:.2}% of quota, writable={}, readable={}",
                        status.name,
                        status.size_bytes,
                        status.used_percent,
                        status.writable,
                        status.readable
                    );
                    statuses.push(status);
                }
                Err(fault) => warn!("dropping bucket {}: {}", bucket, fault),
            }
        }

        statuses
    }
}
