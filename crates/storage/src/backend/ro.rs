//! Read-only object store wrapper.
//!
//! This module provides an object store implementation that wraps other
//! implementations and prevents metadata rewrites from executing, but
//! indicating success on return.

use async_trait::async_trait;

use crate::backend::KeyStream;
use crate::error::Result;
use crate::models::{MetadataReplacement, ObjectMetadata};
use crate::{ObjectStore, StoreHandle};

/// Read-only object store.
///
/// Wraps another store and silently drops all mutating operations, logging
/// an [`info event`](tracing::Event).
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: StoreHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ObjectStore for ReadOnlyBackend {
    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn list_stream<'a>(&'a self, prefix: &'a str) -> KeyStream<'a> {
        self.inner.list_stream(prefix)
    }

    async fn head(&self, key: &str) -> Result<ObjectMetadata> {
        self.inner.head(key).await
    }

    async fn replace_metadata(&self, key: &str, replacement: &MetadataReplacement) -> Result<()> {
        tracing::info!(
            bucket = self.inner.bucket(),
            key,
            content_type = %replacement.content_type,
            "Skipping metadata rewrite during read-only mode"
        );
        Ok(())
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_rewrites_are_dropped() {
        let mock = Arc::new(MockBackend::with_objects([("a.png", ObjectMetadata::new("text/plain"))]));
        let store = ReadOnlyBackend::new(mock.clone());

        let replacement = store.head("a.png").await.unwrap().replacement("image/png");
        store.replace_metadata("a.png", &replacement).await.unwrap();

        assert_eq!(mock.rewrite_calls(), 0);
        assert_eq!(mock.object("a.png").await.unwrap().content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_reads_pass_through() {
        let mock = Arc::new(MockBackend::with_objects([
            ("a.png", ObjectMetadata::new("image/png")),
            ("b.css", ObjectMetadata::new("text/css")),
        ]));
        let store = ReadOnlyBackend::new(mock.clone());

        assert_eq!(store.bucket(), "mock");
        assert_eq!(store.list("").await.unwrap().len(), 2);
        assert_eq!(store.head("b.css").await.unwrap(), ObjectMetadata::new("text/css"));
        assert_eq!(mock.head_calls(), 1);
    }
}
