//! In-memory object store for testing.

use super::KeyStream;
use crate::error::{ErrorKind, Result};
use crate::key::validate as validate_key;
use crate::models::{MetadataReplacement, ObjectMetadata, lowercase_keys};
use crate::ObjectStore;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory object store for testing.
///
/// Objects are stored in a `BTreeMap` behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation. Every
/// call is counted, and individual keys can be configured to fail, so tests
/// can assert exactly which remote calls a run would have made.
///
/// # Examples
///
/// ```
/// use ctfix_storage::{ObjectMetadata, ObjectStore, backend::MockBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockBackend::with_objects([
///     ("assets/logo.png", ObjectMetadata::new("text/plain")),
/// ]);
/// let replacement = store.head("assets/logo.png").await?.replacement("image/png");
/// store.replace_metadata("assets/logo.png", &replacement).await?;
///
/// assert_eq!(store.head_calls(), 1);
/// assert_eq!(store.rewrite_calls(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    bucket: String,
    objects: RwLock<BTreeMap<String, ObjectMetadata>>,
    failing_heads: HashSet<String>,
    failing_rewrites: HashSet<String>,
    failing_prefixes: HashSet<String>,
    list_calls: AtomicUsize,
    head_calls: AtomicUsize,
    rewrite_calls: AtomicUsize,
}

impl MockBackend {
    /// Create a mock store pre-populated with objects.
    ///
    /// User metadata keys are stored lowercased, like S3 does.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_objects(objects: impl IntoIterator<Item = (impl Into<String>, ObjectMetadata)>) -> Self {
        let mut map = BTreeMap::new();
        for (key, metadata) in objects {
            let key = key.into();
            if validate_key(&key).is_err() {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_objects: invalid key {key:?}");
            }
            map.insert(key, ObjectMetadata {
                metadata: lowercase_keys(metadata.metadata),
                ..metadata
            });
        }
        Self {
            bucket: "mock".to_string(),
            objects: RwLock::new(map),
            failing_heads: HashSet::new(),
            failing_rewrites: HashSet::new(),
            failing_prefixes: HashSet::new(),
            list_calls: AtomicUsize::new(0),
            head_calls: AtomicUsize::new(0),
            rewrite_calls: AtomicUsize::new(0),
        }
    }

    /// Change the bucket name reported by the mock store.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Make metadata fetches for `key` fail with a network error.
    pub fn with_failing_head(mut self, key: impl Into<String>) -> Self {
        self.failing_heads.insert(key.into());
        self
    }

    /// Make metadata rewrites for `key` fail with a backend error.
    pub fn with_failing_rewrite(mut self, key: impl Into<String>) -> Self {
        self.failing_rewrites.insert(key.into());
        self
    }

    /// Make listing `prefix` fail with a network error.
    pub fn with_failing_list(mut self, prefix: impl Into<String>) -> Self {
        self.failing_prefixes.insert(prefix.into());
        self
    }

    /// Current metadata of `key`, read directly without counting as a call.
    pub async fn object(&self, key: &str) -> Option<ObjectMetadata> {
        self.objects.read().await.get(key).cloned()
    }

    /// Snapshot of every stored object, for before/after comparisons.
    pub async fn snapshot(&self) -> BTreeMap<String, ObjectMetadata> {
        self.objects.read().await.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn rewrite_calls(&self) -> usize {
        self.rewrite_calls.load(Ordering::SeqCst)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let objects: [(&str, ObjectMetadata); 0] = [];
        Self::with_objects(objects)
    }
}

#[async_trait]
impl ObjectStore for MockBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn list_stream<'a>(&'a self, prefix: &'a str) -> KeyStream<'a> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_prefixes.contains(prefix) {
            let err = exn::Exn::from(ErrorKind::Network(format!("listing {prefix:?} refused")));
            return Box::pin(futures::stream::once(async { Err(err) }));
        }

        Box::pin(stream! {
            // Snapshot matching keys under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let keys: Vec<String> = {
                let guard = self.objects.read().await;
                guard.keys().filter(|key| key.starts_with(prefix)).cloned().collect()
            };
            for key in keys {
                yield Ok(key);
            }
        })
    }

    async fn head(&self, key: &str) -> Result<ObjectMetadata> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let key = validate_key(key)?;
        if self.failing_heads.contains(key) {
            exn::bail!(ErrorKind::Network(format!("head {key:?} timed out")));
        }
        self.objects.read().await.get(key).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(key.to_string())))
    }

    async fn replace_metadata(&self, key: &str, replacement: &MetadataReplacement) -> Result<()> {
        self.rewrite_calls.fetch_add(1, Ordering::SeqCst);
        let key = validate_key(key)?;
        if self.failing_rewrites.contains(key) {
            exn::bail!(ErrorKind::BackendError(format!("copy {key:?} rejected")));
        }
        let mut guard = self.objects.write().await;
        let current = guard.get_mut(key).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(key.to_string())))?;
        *current = ObjectMetadata::apply(replacement);
        Ok(())
    }
}
