//! S3-compatible bucket for recipe images. Handlers only see the
//! [`StorageClient`] trait, so tests can swap in an in-memory bucket.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tracing::{debug, info};

use crate::config::StorageConfig;

/// Image keys embed a fresh UUID, so an object is never rewritten in place.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// S3 refuses presigned URLs valid for longer than a week.
pub const MAX_PRESIGN_SECS: u64 = 7 * 24 * 60 * 60;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Time-limited GET URL; `seconds` is clamped to `1..=MAX_PRESIGN_SECS`.
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

pub fn presign_window(seconds: u64) -> Duration {
    Duration::from_secs(seconds.clamp(1, MAX_PRESIGN_SECS))
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn connect(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(
            &cfg.access_key,
            &cfg.secret_key,
            None,
            None,
            "recipeshare-env",
        );
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        // MinIO only speaks path-style addressing.
        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        info!(bucket = %cfg.bucket, region = %cfg.region, "image bucket client ready");
        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .cache_control(IMAGE_CACHE_CONTROL)
            .send()
            .await
            .with_context(|| format!("store recipe image {}/{key}", self.bucket))?;
        debug!(bucket = %self.bucket, %key, size, "recipe image stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("remove recipe image {}/{key}", self.bucket))?;
        debug!(bucket = %self.bucket, %key, "recipe image removed");
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let window = PresigningConfig::expires_in(presign_window(seconds))
            .context("build presign window")?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(window)
            .await
            .with_context(|| format!("sign read url for {}/{key}", self.bucket))?;
        Ok(request.uri().to_string())
    }
}
