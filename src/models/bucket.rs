//! Per-bucket records: what the remote service reports and what the exporter publishes.

use serde::{Deserialize, Serialize};

/// A bucket as returned by `ListBuckets`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BucketEntry {
    pub name: String,
}

impl BucketEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Storage usage of one bucket.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BucketUsage {
    pub object_count: u64,
    pub size_bytes: u64,
}

/// Quota of one bucket. `0` means no quota is configured.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BucketQuota {
    pub quota_bytes: u64,
}

/// Status of a single bucket produced by one probe.
///
/// Records are immutable once built; `used_percent` is always a finite number.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BucketStatus {
    /// Bucket name, unique within a snapshot.
    pub name: String,

    /// Number of objects stored in the bucket.
    pub object_count: u64,

    /// Total stored bytes.
    pub size_bytes: u64,

    /// Configured quota in bytes, `0` when unlimited.
    pub quota_bytes: u64,

    /// `size_bytes / quota_bytes * 100`, or `0.0` without a quota.
    pub used_percent: f64,

    /// The probe object could be written.
    pub writable: bool,

    /// The probe object could be read back byte-for-byte.
    pub readable: bool,
}

impl BucketStatus {
    pub fn new(
        name: impl Into<String>,
        usage: BucketUsage,
        quota: BucketQuota,
        writable: bool,
        readable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            object_count: usage.object_count,
            size_bytes: usage.size_bytes,
            quota_bytes: quota.quota_bytes,
            used_percent: used_percent(usage.size_bytes, quota.quota_bytes),
            writable,
            readable,
        }
    }
}

/// Share of the quota in use, in percent. Buckets without a quota report `0.0`.
pub fn used_percent(size_bytes: u64, quota_bytes: u64) -> f64 {
    if quota_bytes > 0 {
        size_bytes as f64 / quota_bytes as f64 * 100.0
    } else {
        0.0
    }
}
