//! The deduplicated result of one collection run.

use crate::models::bucket::BucketStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Point-in-time set of bucket records, at most one per bucket name.
#[derive(Serialize, Clone, Debug)]
pub struct CollectionSnapshot {
    pub buckets: Vec<BucketStatus>,
    pub collected_at: DateTime<Utc>,
}

impl CollectionSnapshot {
    /// Build a snapshot from records in arrival order.
    ///
    /// When several records share a name, the first one wins; later ones are
    /// discarded. Callers must pass records in a stable order for the choice to be
    /// repeatable.
    pub fn from_ordered(records: impl IntoIterator<Item = BucketStatus>) -> Self {
        let mut seen = HashSet::new();
        let buckets = records
            .into_iter()
            .filter(|status| seen.insert(status.name.clone()))
            .collect();

        Self {
            buckets,
            collected_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::from_ordered(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&BucketStatus> {
        self.buckets.iter().find(|status| status.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BucketStatus> {
        self.buckets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bucket::{BucketQuota, BucketUsage};

    fn status(name: &str, size: u64) -> BucketStatus {
        BucketStatus::new(
            name,
            BucketUsage {
                object_count: 1,
                size_bytes: size,
            },
            BucketQuota::default(),
            true,
            true,
        )
    }

    #[test]
    fn first_record_wins() {
        let snapshot = CollectionSnapshot::from_ordered(vec![
            status("shared", 1),
            status("other", 2),
            status("shared", 3),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("shared").map(|s| s.size_bytes), Some(1));
        assert_eq!(snapshot.get("other").map(|s| s.size_bytes), Some(2));
    }

    #[test]
    fn order_of_survivors_is_preserved() {
        let snapshot =
            CollectionSnapshot::from_ordered(vec![status("b", 1), status("a", 1), status("b", 2)]);
        let names: Vec<_> = snapshot.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn empty_snapshot() {
        let snapshot = CollectionSnapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.get("anything").is_none());
    }
}
