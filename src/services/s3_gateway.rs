//! src/services/s3_gateway.rs
//!
//! `StorageGateway` backed by any S3-compatible endpoint through `aws-sdk-s3`.
//!
//! S3 has no call for bucket usage, so usage is summed from a paginated
//! `ListObjectsV2`. It has no quota call either, so every bucket reports
//! `quota_bytes = 0` (no quota configured).

use crate::{
    models::{
        account::AccountCredential,
        bucket::{BucketEntry, BucketQuota, BucketUsage},
    },
    services::gateway::{GatewayConnector, GatewayError, GatewayResult, StorageGateway},
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region},
    error::DisplayErrorContext,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Builds one S3 client per account.
#[derive(Clone, Debug, Default)]
pub struct S3Connector;

impl GatewayConnector for S3Connector {
    fn connect(&self, credential: &AccountCredential) -> GatewayResult<Arc<dyn StorageGateway>> {
        Ok(Arc::new(S3Gateway::new(credential)?))
    }
}

#[derive(Clone, Debug)]
pub struct S3Gateway {
    client: Client,
}

impl S3Gateway {
    pub fn new(credential: &AccountCredential) -> GatewayResult<Self> {
        if credential.endpoint.is_empty() {
            return Err(GatewayError::Connect {
                endpoint: credential.endpoint.clone(),
                message: "endpoint is empty".into(),
            });
        }

        let credentials = Credentials::new(
            credential.access_key.clone(),
            credential.secret_key.clone(),
            None,
            None,
            "bucket-usage-exporter",
        );

        // Path-style addressing keeps bucket names out of the host name, which
        // most self-hosted S3-compatible services require.
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(credential.endpoint.clone())
            .region(Region::new(credential.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(config),
        })
    }
}

fn remote<E>(op: &'static str, bucket: &str, err: E) -> GatewayError
where
    E: std::error::Error,
{
    GatewayError::Remote {
        op,
        bucket: bucket.to_string(),
        message: DisplayErrorContext(&err).to_string(),
    }
}

#[async_trait]
impl StorageGateway for S3Gateway {
    async fn list_buckets(&self) -> GatewayResult<Vec<BucketEntry>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| GatewayError::Account {
                op: "ListBuckets",
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name())
            .map(BucketEntry::new)
            .collect())
    }

    async fn get_storage_usage(&self, bucket: &str) -> GatewayResult<BucketUsage> {
        let mut usage = BucketUsage::default();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|err| remote("ListObjectsV2", bucket, err))?;

            for object in page.contents() {
                usage.object_count += 1;
                usage.size_bytes += object.size().unwrap_or_default().max(0) as u64;
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!(
            "bucket {} holds {} objects, {} bytes",
            bucket, usage.object_count, usage.size_bytes
        );
        Ok(usage)
    }

    async fn get_quota(&self, _bucket: &str) -> GatewayResult<BucketQuota> {
        Ok(BucketQuota::default())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> GatewayResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body.into())
            .send()
            .await
            .map_err(|err| remote("PutObject", bucket, err))?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> GatewayResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| remote("GetObject", bucket, err))?;

        let data = output.body.collect().await.map_err(|err| GatewayError::Body {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: err.to_string(),
        })?;

        Ok(data.into_bytes())
    }
}
