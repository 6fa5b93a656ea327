pub mod backend;
pub mod error;
mod key;
mod models;

pub use crate::backend::ObjectStore;
pub use crate::key::{SEPARATOR, file_name, is_directory_marker, validate as validate_key};
pub use crate::models::{CONTENT_DISPOSITION_KEY, CONTENT_TYPE_KEY, MetadataReplacement, ObjectMetadata};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ObjectStore + Send + Sync>;
