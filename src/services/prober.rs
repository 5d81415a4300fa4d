//! src/services/prober.rs
//!
//! Bucket Prober: fetches usage and quota of one bucket, then verifies live
//! access by writing a random payload to a fixed key and reading it back.
//!
//! A failed usage or quota lookup drops the bucket (`ProbeFault`); the write and
//! read checks never fail the probe, they only set `writable` / `readable`.

use crate::{
    models::bucket::BucketStatus,
    services::gateway::{GatewayError, StorageGateway},
};
use bytes::Bytes;
use rand::{Rng, SeedableRng, distributions::Alphanumeric, rngs::StdRng};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PROBE_KEY: &str = "__bucket_usage_exporter_probe.txt";
pub const PROBE_PAYLOAD_LEN: usize = 8;

/// Why a bucket produced no record.
#[derive(Debug, Error)]
pub enum ProbeFault {
    #[error("usage lookup failed: {0}")]
    Usage(GatewayError),
    #[error("quota lookup failed: {0}")]
    Quota(GatewayError),
    #[error("probe timed out after {0:?}")]
    TimedOut(Duration),
    #[error("probe task panicked: {0}")]
    Panicked(String),
}

pub type ProbeResult = Result<BucketStatus, ProbeFault>;

#[derive(Clone, Debug)]
pub struct Prober {
    probe_key: String,
    timeout: Option<Duration>,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_KEY, None)
    }
}

impl Prober {
    pub fn new(probe_key: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            probe_key: probe_key.into(),
            timeout,
        }
    }

    /// Probe `bucket` with a random source owned by this call.
    pub async fn probe(&self, gateway: &dyn StorageGateway, bucket: &str) -> ProbeResult {
        let mut rng = StdRng::from_entropy();
        self.probe_with_rng(gateway, bucket, &mut rng).await
    }

    pub async fn probe_with_rng<R>(
        &self,
        gateway: &dyn StorageGateway,
        bucket: &str,
        rng: &mut R,
    ) -> ProbeResult
    where
        R: Rng + Send,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(gateway, bucket, rng))
                .await
                .map_err(|_| ProbeFault::TimedOut(limit))?,
            None => self.run(gateway, bucket, rng).await,
        }
    }

    async fn run<R>(&self, gateway: &dyn StorageGateway, bucket: &str, rng: &mut R) -> ProbeResult
    where
        R: Rng + Send,
    {
        let usage = gateway
            .get_storage_usage(bucket)
            .await
            .map_err(ProbeFault::Usage)?;
        let quota = gateway.get_quota(bucket).await.map_err(ProbeFault::Quota)?;

        let payload = random_payload(rng, PROBE_PAYLOAD_LEN);
        let writable = self.write_check(gateway, bucket, payload.clone()).await;
        // A matching object from an earlier run still counts as readable.
        let readable = self.read_check(gateway, bucket, &payload).await;

        Ok(BucketStatus::new(bucket, usage, quota, writable, readable))
    }

    async fn write_check(&self, gateway: &dyn StorageGateway, bucket: &str, payload: Bytes) -> bool {
        match gateway.put_object(bucket, &self.probe_key, payload).await {
            Ok(()) => true,
            Err(err) => {
                debug!("write check on {} failed: {}", bucket, err);
                false
            }
        }
    }

    async fn read_check(&self, gateway: &dyn StorageGateway, bucket: &str, payload: &Bytes) -> bool {
        match gateway.get_object(bucket, &self.probe_key).await {
            Ok(body) if body == *payload => true,
            Ok(body) => {
                debug!(
                    "read check on {} returned {} bytes not matching the {} written",
                    bucket,
                    body.len(),
                    payload.len()
                );
                false
            }
            Err(err) => {
                debug!("read check on {} failed: {}", bucket, err);
                false
            }
        }
    }
}

/// Short ASCII alphanumeric payload.
pub fn random_payload<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Bytes {
    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .take(len)
        .collect::<Vec<u8>>()
        .into()
}
