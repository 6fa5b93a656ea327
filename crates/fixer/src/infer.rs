//! Media type inference from object keys.

use ctfix_storage::file_name;

/// Infers the media type an object *should* declare, from its key alone.
///
/// Implementations must be pure: no I/O, same answer for the same key.
/// Closures of the right shape implement this trait, which keeps custom
/// lookup tables a one-liner:
///
/// ```
/// use ctfix_fixer::TypeGuesser;
///
/// let only_css = |key: &str| key.ends_with(".css").then(|| "text/css".to_string());
/// assert_eq!(only_css.guess("site.css").as_deref(), Some("text/css"));
/// assert_eq!(only_css.guess("logo.png"), None);
/// ```
pub trait TypeGuesser: Send + Sync {
    /// Expected media type for `key`, or `None` if it cannot be inferred.
    fn guess(&self, key: &str) -> Option<String>;
}

impl<F> TypeGuesser for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn guess(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Extension-based lookup backed by the [`mime_guess`] table.
///
/// Only the final segment of the key is considered, and extension matching
/// is case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionGuesser;

impl TypeGuesser for ExtensionGuesser {
    fn guess(&self, key: &str) -> Option<String> {
        mime_guess::from_path(file_name(key)).first_raw().map(str::to_string)
    }
}
