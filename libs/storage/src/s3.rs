//! AWS S3 blob store
//!
//! Uses standard AWS SDK credential resolution:
//! - Environment variables: `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`
//! - IAM roles (EKS IRSA, EC2 instance profile)
//! - Shared credentials file
//!
//! A custom endpoint (MinIO) can be set through `S3Config::endpoint`, which
//! switches the client to path-style addressing.

use async_trait::async_trait;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use core_config::S3Config;
use tracing::{debug, info};

use crate::{BlobStore, StorageError, StorageResult};

/// S3-backed implementation of [`BlobStore`]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create from an [`S3Config`] using the default AWS credential chain.
    pub async fn from_config(config: &S3Config) -> StorageResult<Self> {
        let sdk_config = aws_config::from_env().load().await;

        let client = match &config.endpoint {
            Some(endpoint) => {
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                Client::from_conf(s3_config)
            }
            None => Client::new(&sdk_config),
        };

        Ok(Self::new(client, config.bucket.clone()))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn delete_folder(&self, prefix: &str) -> StorageResult<()> {
        let mut continuation_token: Option<String> = None;
        let mut deleted = 0usize;

        loop {
            let listing = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| StorageError::S3(e.to_string()))?;

            let objects: Vec<ObjectIdentifier> = listing
                .contents()
                .iter()
                .filter_map(|obj| obj.key().map(str::to_string))
                .map(|key| {
                    ObjectIdentifier::builder()
                        .key(key)
                        .build()
                        .map_err(|e| StorageError::S3(e.to_string()))
                })
                .collect::<StorageResult<_>>()?;

            if objects.is_empty() {
                break;
            }

            deleted += objects.len();

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| StorageError::S3(e.to_string()))?;

            self.client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| StorageError::S3(e.to_string()))?;

            if listing.is_truncated() == Some(true) {
                continuation_token = listing.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        if deleted > 0 {
            info!(prefix, deleted, "Deleted blob folder");
        } else {
            debug!(prefix, "Blob folder already empty");
        }

        Ok(())
    }
}
