//! In-memory gateway for tests.
//!
//! Stores objects in a map, counts concurrent calls and can be told to fail,
//! garble, stall or panic per bucket.

use crate::{
    models::{
        account::AccountCredential,
        bucket::{BucketEntry, BucketQuota, BucketUsage},
    },
    services::gateway::{GatewayConnector, GatewayError, GatewayResult, StorageGateway},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fault {
    Usage,
    Quota,
    Put,
    Get,
    /// `get_object` returns only the first byte of what was stored.
    TruncatedGet,
    /// `get_storage_usage` panics.
    PanicUsage,
}

#[derive(Default)]
pub struct FakeGateway {
    buckets: Vec<(String, BucketUsage, BucketQuota)>,
    objects: Mutex<HashMap<(String, String), Bytes>>,
    faults: HashSet<(String, Fault)>,
    fail_list: bool,
    panic_list: bool,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    releases: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, name: &str, size_bytes: u64, quota_bytes: u64) -> Self {
        self.buckets.push((
            name.to_string(),
            BucketUsage {
                object_count: 1,
                size_bytes,
            },
            BucketQuota { quota_bytes },
        ));
        self
    }

    pub fn with_fault(mut self, bucket: &str, fault: Fault) -> Self {
        self.faults.insert((bucket.to_string(), fault));
        self
    }

    pub fn with_object(self, bucket: &str, key: &str, body: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), Bytes::copy_from_slice(body));
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn panicking_list(mut self) -> Self {
        self.panic_list = true;
        self
    }

    /// Every call sleeps this long while counted as in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn stored(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    fn has_fault(&self, bucket: &str, fault: Fault) -> bool {
        self.faults.contains(&(bucket.to_string(), fault))
    }

    fn remote_error(op: &'static str, bucket: &str) -> GatewayError {
        GatewayError::Remote {
            op,
            bucket: bucket.to_string(),
            message: "injected failure".into(),
        }
    }

    fn find(&self, bucket: &str) -> Option<&(String, BucketUsage, BucketQuota)> {
        self.buckets.iter().find(|(name, _, _)| name == bucket)
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        guard
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageGateway for FakeGateway {
    async fn list_buckets(&self) -> GatewayResult<Vec<BucketEntry>> {
        let _call = self.enter().await;
        if self.panic_list {
            panic!("injected panic in list_buckets");
        }
        if self.fail_list {
            return Err(GatewayError::Account {
                op: "ListBuckets",
                message: "injected failure".into(),
            });
        }
        Ok(self
            .buckets
            .iter()
            .map(|(name, _, _)| BucketEntry::new(name.clone()))
            .collect())
    }

    async fn get_storage_usage(&self, bucket: &str) -> GatewayResult<BucketUsage> {
        let _call = self.enter().await;
        if self.has_fault(bucket, Fault::PanicUsage) {
            panic!("injected panic in get_storage_usage for {}", bucket);
        }
        if self.has_fault(bucket, Fault::Usage) {
            return Err(Self::remote_error("GetStorageUsage", bucket));
        }
        self.find(bucket)
            .map(|(_, usage, _)| *usage)
            .ok_or_else(|| Self::remote_error("GetStorageUsage", bucket))
    }

    async fn get_quota(&self, bucket: &str) -> GatewayResult<BucketQuota> {
        let _call = self.enter().await;
        if self.has_fault(bucket, Fault::Quota) {
            return Err(Self::remote_error("GetQuota", bucket));
        }
        self.find(bucket)
            .map(|(_, _, quota)| *quota)
            .ok_or_else(|| Self::remote_error("GetQuota", bucket))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> GatewayResult<()> {
        let _call = self.enter().await;
        if self.has_fault(bucket, Fault::Put) {
            return Err(Self::remote_error("PutObject", bucket));
        }
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> GatewayResult<Bytes> {
        let _call = self.enter().await;
        if self.has_fault(bucket, Fault::Get) {
            return Err(Self::remote_error("GetObject", bucket));
        }
        let body = self
            .stored(bucket, key)
            .ok_or_else(|| Self::remote_error("GetObject", bucket))?;
        if self.has_fault(bucket, Fault::TruncatedGet) {
            return Ok(body.slice(..body.len().min(1)));
        }
        Ok(body)
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out pre-built fake gateways keyed by endpoint.
#[derive(Default)]
pub struct FakeConnector {
    gateways: HashMap<String, Arc<FakeGateway>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, endpoint: &str, gateway: FakeGateway) -> Self {
        self.gateways
            .insert(endpoint.to_string(), Arc::new(gateway));
        self
    }

    pub fn gateway(&self, endpoint: &str) -> Arc<FakeGateway> {
        Arc::clone(&self.gateways[endpoint])
    }
}

impl GatewayConnector for FakeConnector {
    fn connect(&self, credential: &AccountCredential) -> GatewayResult<Arc<dyn StorageGateway>> {
        match self.gateways.get(&credential.endpoint) {
            Some(gateway) => Ok(Arc::clone(gateway) as Arc<dyn StorageGateway>),
            None => Err(GatewayError::Connect {
                endpoint: credential.endpoint.clone(),
                message: "unknown endpoint".into(),
            }),
        }
    }
}

pub fn credential(endpoint: &str) -> AccountCredential {
    AccountCredential::new(endpoint, "AKID", "SECRET")
}
