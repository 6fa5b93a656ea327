use crate::error::{ErrorKind, Result};
use ctfix_storage::ObjectStore;
use exn::ResultExt;
use futures::TryStreamExt;
use std::collections::BTreeSet;

/// Collects the distinct keys found under every prefix.
///
/// Each prefix is listed independently and the results are merged by set
/// union, so a key reachable through several overlapping prefixes appears
/// once. An empty `prefixes` slice lists the whole bucket. A prefix matching
/// nothing contributes nothing; a listing failure aborts enumeration.
pub async fn candidates(store: &dyn ObjectStore, prefixes: &[String]) -> Result<BTreeSet<String>> {
    let everything = [String::new()];
    let prefixes = if prefixes.is_empty() { &everything[..] } else { prefixes };

    let mut keys = BTreeSet::new();
    for prefix in prefixes {
        let mut listing = store.list_stream(prefix);
        let mut found = 0_usize;
        while let Some(key) = listing.try_next().await.or_raise(|| ErrorKind::Enumerate(prefix.clone()))? {
            found += 1;
            keys.insert(key);
        }
        tracing::info!(bucket = store.bucket(), prefix = %prefix, found, "Listed prefix");
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctfix_storage::ObjectMetadata;
    use ctfix_storage::backend::MockBackend;

    fn store() -> MockBackend {
        MockBackend::with_objects([
            ("css/site.css", ObjectMetadata::new("text/css")),
            ("img/a.png", ObjectMetadata::new("text/plain")),
            ("img/icons/b.png", ObjectMetadata::new("image/png")),
            ("index.html", ObjectMetadata::new("text/html")),
        ])
    }

    fn prefixes(given: &[&str]) -> Vec<String> {
        given.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_everything_by_default() {
        let store = store();
        let keys = candidates(&store, &[]).await.unwrap();
        assert_eq!(keys.len(), 4);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_prefixes_deduplicate() {
        let store = store();
        let keys = candidates(&store, &prefixes(&["img/", "img/icons/", "css/"])).await.unwrap();
        let expected: BTreeSet<String> =
            ["css/site.css", "img/a.png", "img/icons/b.png"].into_iter().map(String::from).collect();
        assert_eq!(keys, expected);
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_prefix_is_not_an_error() {
        let store = store();
        let keys = candidates(&store, &prefixes(&["nothing/", "css/"])).await.unwrap();
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["css/site.css"]);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts() {
        let store = store().with_failing_list("img/");
        let err = candidates(&store, &prefixes(&["css/", "img/"])).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Enumerate("img/".to_string()));
    }
}
