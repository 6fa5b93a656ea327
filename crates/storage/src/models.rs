//! Storage models.
//!
//! These types represent the per-object metadata snapshot fetched from a
//! backend, and the exact set of headers sent back when that metadata is
//! replaced in place.

use std::collections::HashMap;

/// User-metadata key that some upload tools use to smuggle a media type in.
pub const CONTENT_TYPE_KEY: &str = "Content-Type";
/// User-metadata key used to restate an object's content-disposition.
pub const CONTENT_DISPOSITION_KEY: &str = "Content-Disposition";

/// Object metadata returned by storage backends.
///
/// A snapshot taken at fetch time; never cached across objects or runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Declared media type, if the object has one
    pub content_type: Option<String>,
    /// Content-Disposition header, if set
    pub content_disposition: Option<String>,
    /// Arbitrary user metadata (`x-amz-meta-*` on S3)
    pub metadata: HashMap<String, String>,
}

impl ObjectMetadata {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Self::default()
        }
    }

    pub fn with_content_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.content_disposition = Some(disposition.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Build the metadata to send when retyping this object to `expected`.
    ///
    /// The copy-in-place operation replaces *all* metadata, so anything that
    /// should survive has to be restated:
    ///
    /// - Existing user metadata is carried over as-is.
    /// - A `Content-Type` user-metadata entry is overwritten with `expected`;
    ///   left alone it would keep surfacing the stale type as a custom
    ///   `x-amz-meta-content-type` header.
    /// - A set content-disposition is copied into the user metadata under
    ///   `Content-Disposition`, and restated as the real header.
    ///
    /// User-metadata keys are case-insensitive (S3 hands them back
    /// lowercased), so both entries are matched regardless of case and
    /// always end up under exactly one spelling.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctfix_storage::ObjectMetadata;
    ///
    /// let current = ObjectMetadata::new("text/plain")
    ///     .with_content_disposition("attachment")
    ///     .with_metadata("content-type", "text/plain")
    ///     .with_metadata("owner", "ops");
    /// let replacement = current.replacement("image/png");
    ///
    /// assert_eq!(replacement.content_type, "image/png");
    /// assert_eq!(replacement.metadata["Content-Type"], "image/png");
    /// assert_eq!(replacement.metadata["Content-Disposition"], "attachment");
    /// assert_eq!(replacement.metadata["owner"], "ops");
    /// assert_eq!(replacement.metadata.len(), 3);
    /// ```
    pub fn replacement(&self, expected: &str) -> MetadataReplacement {
        let mut metadata = self.metadata.clone();
        if take_entry(&mut metadata, CONTENT_TYPE_KEY) {
            metadata.insert(CONTENT_TYPE_KEY.to_string(), expected.to_string());
        }
        take_entry(&mut metadata, CONTENT_DISPOSITION_KEY);
        if let Some(disposition) = &self.content_disposition {
            metadata.insert(CONTENT_DISPOSITION_KEY.to_string(), disposition.clone());
        }
        MetadataReplacement {
            content_type: expected.to_string(),
            content_disposition: self.content_disposition.clone(),
            metadata,
        }
    }

    /// The metadata an object will carry after `replacement` is applied.
    ///
    /// User-metadata keys come back lowercased, the way S3 stores them.
    pub fn apply(replacement: &MetadataReplacement) -> Self {
        Self {
            content_type: Some(replacement.content_type.clone()),
            content_disposition: replacement.content_disposition.clone(),
            metadata: lowercase_keys(replacement.metadata.clone()),
        }
    }
}

/// Lowercase every user-metadata key, as S3 does on write.
pub(crate) fn lowercase_keys(metadata: HashMap<String, String>) -> HashMap<String, String> {
    metadata.into_iter().map(|(key, value)| (key.to_ascii_lowercase(), value)).collect()
}

/// Remove every spelling of `name`; returns whether any was present.
fn take_entry(metadata: &mut HashMap<String, String>, name: &str) -> bool {
    let before = metadata.len();
    metadata.retain(|key, _| !key.eq_ignore_ascii_case(name));
    metadata.len() != before
}

/// Everything a metadata-replacing copy sends to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataReplacement {
    /// New declared media type
    pub content_type: String,
    /// Content-Disposition to restate, if the object had one
    pub content_disposition: Option<String>,
    /// Complete user metadata mapping after the rewrite
    pub metadata: HashMap<String, String>,
}
