//! src/services/gateway.rs
//!
//! The seam between the collector and a remote object-storage service. The
//! collector only sees the `StorageGateway` trait; concrete backends (see
//! `s3_gateway`) and the in-memory fake used by tests implement it.

use crate::models::{
    account::AccountCredential,
    bucket::{BucketEntry, BucketQuota, BucketUsage},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{ops::Deref, sync::Arc};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{op} failed for bucket `{bucket}`: {message}")]
    Remote {
        op: &'static str,
        bucket: String,
        message: String,
    },
    #[error("{op} failed: {message}")]
    Account { op: &'static str, message: String },
    #[error("reading body of `{bucket}/{key}` failed: {message}")]
    Body {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("could not connect to `{endpoint}`: {message}")]
    Connect { endpoint: String, message: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Remote operations the collector needs from one account.
///
/// Every call is independently fallible and may take arbitrarily long.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn list_buckets(&self) -> GatewayResult<Vec<BucketEntry>>;

    async fn get_storage_usage(&self, bucket: &str) -> GatewayResult<BucketUsage>;

    async fn get_quota(&self, bucket: &str) -> GatewayResult<BucketQuota>;

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> GatewayResult<()>;

    /// Fetch an object and read its whole body into memory.
    async fn get_object(&self, bucket: &str, key: &str) -> GatewayResult<Bytes>;

    /// Release connections held by this client. Called once per account pass.
    fn release(&self) {}
}

/// Opens a gateway scoped to one account.
pub trait GatewayConnector: Send + Sync {
    fn connect(&self, credential: &AccountCredential) -> GatewayResult<Arc<dyn StorageGateway>>;
}

/// Owns an account's gateway for the length of its collection pass.
///
/// Dropping the lease releases the client, whether the pass returned normally,
/// bailed out early, or is unwinding from a panic.
pub struct GatewayLease {
    gateway: Arc<dyn StorageGateway>,
    account: String,
}

impl GatewayLease {
    pub fn acquire(
        connector: &dyn GatewayConnector,
        credential: &AccountCredential,
    ) -> GatewayResult<Self> {
        let gateway = connector.connect(credential)?;
        debug!("acquired gateway client for {}", credential.label());
        Ok(Self {
            gateway,
            account: credential.label(),
        })
    }

    /// A handle for a child task. Must not outlive the lease.
    pub fn handle(&self) -> Arc<dyn StorageGateway> {
        Arc::clone(&self.gateway)
    }
}

impl Deref for GatewayLease {
    type Target = dyn StorageGateway;

    fn deref(&self) -> &Self::Target {
        self.gateway.as_ref()
    }
}

impl Drop for GatewayLease {
    fn drop(&mut self) {
        self.gateway.release();
        debug!("released gateway client for {}", self.account);
    }
}
