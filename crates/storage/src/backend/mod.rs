//! Object store trait and implementations.
//!
//! This module defines the `ObjectStore` trait, the narrow interface the
//! fixer needs from a bucket: enumerate keys, read an object's metadata, and
//! replace that metadata in place without touching the object's content.

#[cfg(feature = "mock")]
mod mock;
mod ro;
#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
#[cfg(feature = "s3")]
pub use self::s3::S3Backend;
use crate::error::Result;
use crate::models::{MetadataReplacement, ObjectMetadata};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

pub(crate) type KeyStream<'a> = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;

/// Unified interface for object store backends.
///
/// All operations are asynchronous; every call is an independent remote
/// round-trip with no state carried between keys.
///
/// # Examples
///
/// ```
/// use ctfix_storage::{ObjectStore, error::Result};
///
/// async fn declared_type(store: &dyn ObjectStore, key: &str) -> Result<Option<String>> {
///     Ok(store.head(key).await?.content_type)
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket this store operates on (used for logging).
    fn bucket(&self) -> &str;

    /// List all keys starting with `prefix`.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream every key starting with `prefix`.
    ///
    /// An empty prefix matches every key in the bucket. Backends that page
    /// their listings must keep fetching until the listing is exhausted; a
    /// prefix that matches nothing yields an empty stream, not an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use ctfix_storage::{ObjectStore, error::Result};
    /// # async fn example(store: &dyn ObjectStore) -> Result<()> {
    /// let mut stream = store.list_stream("assets/");
    /// while let Some(key) = stream.try_next().await? {
    ///     println!("{key}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, prefix: &'a str) -> KeyStream<'a>;

    /// Fetch an object's current metadata without reading its content.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the object
    /// does not exist.
    async fn head(&self, key: &str) -> Result<ObjectMetadata>;

    /// Replace an object's metadata by copying it onto itself.
    ///
    /// Source and destination are the same key in the same bucket; the copy
    /// uses the "replace" metadata directive so that every field of
    /// `replacement` becomes the object's complete metadata. Applying the same
    /// replacement twice leaves the object unchanged.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the object
    /// does not exist.
    async fn replace_metadata(&self, key: &str, replacement: &MetadataReplacement) -> Result<()>;
}
