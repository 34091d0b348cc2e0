//! S3 image store for deployments with a bucket configured.

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use crate::domain::listing::Locator;
use crate::domain::ports::{ImageStore, StorageError};

use super::object_name;

const KEY_PREFIX: &str = "listings";

/// Stores listing images as objects under a `listings/` prefix.
pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
    region: String,
}

impl S3ImageStore {
    /// Create a store writing to `bucket` in `region`.
    pub fn new(client: S3Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Build a client from the ambient AWS environment (credentials chain,
    /// shared config) and wrap it for the given bucket.
    pub async fn from_env(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(S3Client::new(&config), bucket, region)
    }

    fn content_type(filename: &str) -> &'static str {
        match filename.rsplit('.').next() {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Result<Locator, StorageError> {
        let key = format!("{KEY_PREFIX}/{}", object_name(filename));
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(Self::content_type(filename))
            .send()
            .await
            .map_err(|err| {
                StorageError::write(format!("s3://{}/{key}: {err}", self.bucket))
            })?;
        debug!(bucket = %self.bucket, key = %key, "stored listing image");
        Ok(Locator::new(key))
    }

    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(locator.as_ref())
            .send()
            .await
            .map_err(|err| {
                StorageError::delete(format!(
                    "s3://{}/{}: {err}",
                    self.bucket,
                    locator.as_ref()
                ))
            })?;
        Ok(())
    }

    fn public_url(&self, locator: &Locator) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket,
            self.region,
            locator.as_ref()
        )
    }
}
