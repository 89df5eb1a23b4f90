use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tracing::info;
use url::Url;

use crate::transcode::pipeline::ArtifactStore;

/// Bucket + key pair decomposed from a virtual-hosted-style S3 URL
/// (`https://<bucket>.s3.amazonaws.com/<key>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("invalid source url: {raw}"))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("source url has no host: {raw}"))?;
        let bucket = host
            .split('.')
            .next()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| anyhow!("source url has no bucket: {raw}"))?;
        let key = url.path().trim_start_matches('/');
        if key.is_empty() {
            bail!("source url has no object key: {raw}");
        }
        Ok(Self::new(bucket, key))
    }

    pub fn public_url(&self) -> String {
        format!("https://{}.s3.amazonaws.com/{}", self.bucket, self.key)
    }
}

#[derive(Clone)]
pub struct StorageService {
    client: Client,
}

impl StorageService {
    pub async fn new(endpoint: &str, region: &str, access_key: &str, secret_key: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO
            .build();

        let client = Client::from_conf(config);

        info!("✅ Connected to S3 ({})", endpoint);

        Self { client }
    }
}

#[async_trait]
impl ArtifactStore for StorageService {
    async fn fetch(&self, location: &ObjectLocation, dest: &Path) -> Result<()> {
        let object = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| anyhow!("failed to get s3://{}/{}: {}", location.bucket, location.key, e))?;

        let data = object
            .body
            .collect()
            .await
            .context("failed to read object body")?
            .into_bytes();

        tokio::fs::write(dest, &data)
            .await
            .with_context(|| format!("failed to write {}", dest.display()))?;

        Ok(())
    }

    async fn push(&self, local: &Path, location: &ObjectLocation) -> Result<String> {
        let body = ByteStream::from_path(local)
            .await
            .with_context(|| format!("failed to open {}", local.display()))?;
        let content_type = mime_guess::from_path(local).first_or_octet_stream();

        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .body(body)
            .content_type(content_type.as_ref())
            .send()
            .await
            .map_err(|e| anyhow!("failed to put s3://{}/{}: {}", location.bucket, location.key, e))?;

        Ok(location.public_url())
    }
}
