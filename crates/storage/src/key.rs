//! Object key validation and classification.
//!
//! Object keys are opaque strings as far as the store is concerned. The only
//! structure this crate cares about is the `/` separator, used by consoles
//! and sync tools to fake a directory hierarchy.

use crate::error::{ErrorKind, Result};

/// Separator used by pseudo-directory hierarchies in object stores.
pub const SEPARATOR: char = '/';

/// Validates an object key before it is sent to a backend.
///
/// Unlike filesystem paths, object keys are **not** normalized: `a//b` and
/// `a/./b` are distinct objects in S3. Only keys that no backend can address
/// are rejected: the empty key, and keys containing a null byte.
///
/// # Examples
///
/// ```
/// use ctfix_storage::validate_key;
/// assert_eq!(validate_key("assets/logo.png").unwrap(), "assets/logo.png");
/// assert_eq!(validate_key("a//b/./c").unwrap(), "a//b/./c");
/// assert!(validate_key("").is_err());
/// assert!(validate_key("a\0b").is_err());
/// ```
pub fn validate(key: &str) -> Result<&str> {
    if key.is_empty() || key.contains('\0') {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(key)
}

/// Whether a key is a pseudo-directory marker (zero-byte object whose key
/// ends with the separator).
///
/// ```
/// use ctfix_storage::is_directory_marker;
/// assert!(is_directory_marker("images/"));
/// assert!(!is_directory_marker("images/logo.png"));
/// ```
pub fn is_directory_marker(key: &str) -> bool {
    key.ends_with(SEPARATOR)
}

/// Final segment of a key, after the last separator.
pub fn file_name(key: &str) -> &str {
    key.rsplit(SEPARATOR).next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert_eq!(validate("simple.html").unwrap(), "simple.html");
        assert_eq!(validate("a/b/c/file.css").unwrap(), "a/b/c/file.css");
        // Keys are never normalized
        assert_eq!(validate("../escape.png").unwrap(), "../escape.png");
        assert_eq!(validate("dir/").unwrap(), "dir/");
    }

    #[test]
    fn test_invalid_keys() {
        let err = validate("").unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidKey(String::new()));
        assert!(validate("\0").is_err());
        assert!(validate("a/\0/b.png").is_err());
    }

    #[test]
    fn test_directory_markers() {
        assert!(is_directory_marker("dir/"));
        assert!(is_directory_marker("a/b/c/"));
        assert!(is_directory_marker("/"));
        assert!(!is_directory_marker("dir"));
        assert!(!is_directory_marker("dir/file"));
        assert!(!is_directory_marker(""));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("a/b/c.png"), "c.png");
        assert_eq!(file_name("c.png"), "c.png");
        assert_eq!(file_name("dir/"), "");
    }
}
