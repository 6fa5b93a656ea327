//! S3-compatible object store.
//!
//! This module provides an object store implementation for S3-compatible
//! services including AWS S3, Backblaze B2, Tigris (Fly.io), and others.
//!
//! # Credentials
//!
//! Credentials are provided explicitly (command-line flags or environment).
//! The AWS SDK credential chain (profiles, instance metadata) is not used.

use crate::{
    ObjectStore,
    backend::KeyStream,
    error::{ErrorKind, Result},
    key::validate as validate_key,
    models::{MetadataReplacement, ObjectMetadata, lowercase_keys},
};
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::{DisplayErrorContext, SdkError},
    types::MetadataDirective,
};

/// S3-compatible object store bound to a single bucket.
///
/// # Supported Services
///
/// - AWS S3
/// - Backblaze B2 (via S3-compatible API)
/// - Tigris (Fly.io storage)
/// - MinIO
/// - Other S3-compatible services
///
/// # Examples
///
/// ```no_run
/// use ctfix_storage::backend::S3Backend;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = S3Backend::new(
///     "my-bucket",
///     "ap-northeast-1",
///     None::<String>,
///     "access_key_id",
///     "secret_access_key",
/// ).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    /// Create a new S3 object store.
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region or provider-specific region (e.g., "us-west-004" for Backblaze)
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - AWS/provider access key ID
    /// * `key_secret` - AWS/provider secret access key
    pub async fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.is_empty() {
            exn::bail!(ErrorKind::BackendError("bucket name must not be empty".to_string()));
        }
        let region = Region::new(region.into());
        let credentials = Credentials::new(key_id, key_secret, None, None, "ctfix-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(region)
            // Configure retry policy with exponential backoff (1 initial + 3 retries)
            .retry_config(RetryConfig::standard().with_max_attempts(4));
        // Set custom endpoint for non-AWS services, with path-style addressing
        // for better compatibility (Backblaze, MinIO, etc.)
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url).force_path_style(true);
        }
        Ok(Self::from_client(Client::from_conf(config_builder.build()), bucket))
    }

    /// Wrap an already-configured client.
    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// `CopySource` value addressing `key` in this bucket.
    fn copy_source(&self, key: &str) -> String {
        format!("{}/{}", self.bucket, urlencoding::encode(key))
    }
}

/// Map an SDK failure onto a storage error category.
fn classify<E>(err: &SdkError<E>, key: &str, is_not_found: impl Fn(&E) -> bool) -> ErrorKind
where
    E: std::error::Error + Send + Sync + 'static,
{
    let detail = DisplayErrorContext(err).to_string();
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::Network(detail),
        SdkError::ServiceError(service) if is_not_found(service.err()) => ErrorKind::NotFound(key.to_string()),
        SdkError::ServiceError(service) => match service.raw().status().as_u16() {
            404 => ErrorKind::NotFound(key.to_string()),
            401 | 403 => ErrorKind::PermissionDenied(key.to_string()),
            _ => ErrorKind::BackendError(detail),
        },
        _ => ErrorKind::BackendError(detail),
    }
}

#[async_trait]
impl ObjectStore for S3Backend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn list_stream<'a>(&'a self, prefix: &'a str) -> KeyStream<'a> {
        Box::pin(stream! {
            let mut pages = self.client.list_objects_v2().bucket(&self.bucket).prefix(prefix).into_paginator().send();
            let mut page_count = 0_usize;
            while let Some(page) = pages.next().await {
                let page = match page {
                    Ok(page) => page,
                    Err(err) => {
                        yield Err(exn::Exn::from(classify(&err, prefix, |_| false)));
                        return;
                    },
                };
                page_count += 1;
                for object in page.contents() {
                    if let Some(key) = object.key() {
                        yield Ok(key.to_string());
                    }
                }
            }
            tracing::debug!(bucket = %self.bucket, prefix, pages = page_count, "Listing complete");
        })
    }

    async fn head(&self, key: &str) -> Result<ObjectMetadata> {
        let key = validate_key(key)?;
        let output = match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => exn::bail!(classify(&err, key, |e| e.is_not_found())),
        };
        Ok(ObjectMetadata {
            content_type: output.content_type().map(str::to_string),
            content_disposition: output.content_disposition().map(str::to_string),
            metadata: lowercase_keys(output.metadata().cloned().unwrap_or_default()),
        })
    }

    async fn replace_metadata(&self, key: &str, replacement: &MetadataReplacement) -> Result<()> {
        let key = validate_key(key)?;
        let result = self
            .client
            .copy_object()
            .bucket(&self.bucket)
            .key(key)
            .copy_source(self.copy_source(key))
            .metadata_directive(MetadataDirective::Replace)
            .content_type(&replacement.content_type)
            .set_content_disposition(replacement.content_disposition.clone())
            .set_metadata(Some(replacement.metadata.clone()))
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => exn::bail!(classify(&err, key, |_| false)),
        }
    }
}
