//! Run settings for ctfix.
//!
//! Settings are layered with [`figment`], lowest precedence first:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. Environment variables prefixed with `CTFIX_` (e.g. `CTFIX_SECRET_KEY`)
//! 3. Command-line flags ([`Overrides`]), only those actually given
//!
//! There is no configuration file: every run is described entirely by its
//! environment and arguments.

pub mod error;

use crate::error::{ErrorKind, Result};
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Prefix for environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "CTFIX_";
/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "ap-northeast-1";
/// Number of concurrent fix workers used when none is configured.
pub const DEFAULT_WORKERS: usize = 4;
/// How long (seconds) an idle worker waits for the next key before giving up.
pub const DEFAULT_QUEUE_TIMEOUT: u64 = 60 * 60;

/// Fully resolved settings for one run.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, Backblaze, ...)
    pub endpoint: Option<String>,
    /// Key prefixes to audit; a single empty prefix matches every key.
    pub prefixes: Vec<String>,
    pub workers: usize,
    pub verbose: bool,
    pub dry_run: bool,
    /// Seconds
    pub queue_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            prefixes: vec![String::new()],
            workers: DEFAULT_WORKERS,
            verbose: false,
            dry_run: false,
            queue_timeout: DEFAULT_QUEUE_TIMEOUT,
        }
    }
}

// Hand-written so the secret never ends up in logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("prefixes", &self.prefixes)
            .field("workers", &self.workers)
            .field("verbose", &self.verbose)
            .field("dry_run", &self.dry_run)
            .field("queue_timeout", &self.queue_timeout)
            .finish()
    }
}

/// Values given explicitly on the command line.
///
/// Unset fields are skipped during serialization so they never mask a value
/// from a lower layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_timeout: Option<u64>,
}

impl Settings {
    /// The layered [`Figment`] settings are extracted from.
    pub fn figment(overrides: &Overrides) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    /// Extract and validate settings from every layer.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::from_figment(&Self::figment(overrides))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let settings: Settings = figment.extract().map_err(|e| exn::Exn::from(ErrorKind::Extract(e.to_string())))?;
        let settings = settings.validate()?;
        tracing::debug!(settings = ?settings, "Settings loaded");
        Ok(settings)
    }

    /// Check required fields and ranges, normalizing what can be normalized.
    ///
    /// An empty prefix list is treated as "everything" (a single empty
    /// prefix), and duplicate prefixes are dropped.
    pub fn validate(mut self) -> Result<Self> {
        for (field, value) in [
            ("access_key", &self.access_key),
            ("secret_key", &self.secret_key),
            ("bucket", &self.bucket),
        ] {
            if value.trim().is_empty() {
                exn::bail!(ErrorKind::MissingField(field));
            }
        }
        if self.workers == 0 {
            exn::bail!(ErrorKind::InvalidWorkers(self.workers));
        }
        if self.queue_timeout == 0 {
            exn::bail!(ErrorKind::InvalidTimeout);
        }
        if self.region.trim().is_empty() {
            self.region = DEFAULT_REGION.to_string();
        }
        self.endpoint = self.endpoint.filter(|endpoint| !endpoint.trim().is_empty());
        if self.prefixes.is_empty() {
            self.prefixes.push(String::new());
        }
        let mut seen = std::collections::HashSet::new();
        self.prefixes.retain(|prefix| seen.insert(prefix.clone()));
        Ok(self)
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    fn required() -> Overrides {
        Overrides {
            access_key: Some("AKIA".to_string()),
            secret_key: Some("shh".to_string()),
            bucket: Some("assets".to_string()),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load(&required()).unwrap();
            assert_eq!(settings.region, DEFAULT_REGION);
            assert_eq!(settings.prefixes, vec![String::new()]);
            assert_eq!(settings.workers, 4);
            assert!(!settings.verbose);
            assert!(!settings.dry_run);
            assert_eq!(settings.queue_timeout(), Duration::from_secs(3600));
            Ok(())
        });
    }

    #[test]
    fn test_env_layer() {
        Jail::expect_with(|jail| {
            jail.set_env("CTFIX_ACCESS_KEY", "env-key");
            jail.set_env("CTFIX_SECRET_KEY", "env-secret");
            jail.set_env("CTFIX_BUCKET", "env-bucket");
            jail.set_env("CTFIX_WORKERS", "8");
            jail.set_env("CTFIX_DRY_RUN", "true");
            let settings = Settings::load(&Overrides::default()).unwrap();
            assert_eq!(settings.access_key, "env-key");
            assert_eq!(settings.bucket, "env-bucket");
            assert_eq!(settings.workers, 8);
            assert!(settings.dry_run);
            Ok(())
        });
    }

    #[test]
    fn test_flags_override_env() {
        Jail::expect_with(|jail| {
            jail.set_env("CTFIX_BUCKET", "env-bucket");
            jail.set_env("CTFIX_WORKERS", "8");
            let overrides = Overrides {
                workers: Some(2),
                prefixes: Some(vec!["css/".to_string(), "img/".to_string()]),
                ..required()
            };
            let settings = Settings::load(&overrides).unwrap();
            assert_eq!(settings.bucket, "assets");
            assert_eq!(settings.workers, 2);
            assert_eq!(settings.prefixes, vec!["css/", "img/"]);
            Ok(())
        });
    }

    #[test]
    fn test_unset_flags_do_not_mask_env() {
        Jail::expect_with(|jail| {
            jail.set_env("CTFIX_REGION", "eu-west-1");
            let settings = Settings::load(&required()).unwrap();
            assert_eq!(settings.region, "eu-west-1");
            Ok(())
        });
    }

    #[test]
    fn test_bad_env_type() {
        Jail::expect_with(|jail| {
            jail.set_env("CTFIX_WORKERS", "lots");
            let err = Settings::load(&required()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Extract(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case(Overrides { access_key: None, ..required() }, ErrorKind::MissingField("access_key"))]
    #[case(Overrides { secret_key: Some(" ".to_string()), ..required() }, ErrorKind::MissingField("secret_key"))]
    #[case(Overrides { bucket: None, ..required() }, ErrorKind::MissingField("bucket"))]
    #[case(Overrides { workers: Some(0), ..required() }, ErrorKind::InvalidWorkers(0))]
    #[case(Overrides { queue_timeout: Some(0), ..required() }, ErrorKind::InvalidTimeout)]
    fn test_invalid(#[case] overrides: Overrides, #[case] expected: ErrorKind) {
        Jail::expect_with(|_jail| {
            let err = Settings::load(&overrides).unwrap_err();
            assert_eq!(*err, expected);
            Ok(())
        });
    }

    #[rstest]
    #[case(vec![], vec![""])]
    #[case(vec![""], vec![""])]
    #[case(vec!["a/", "b/", "a/"], vec!["a/", "b/"])]
    fn test_prefix_normalization(#[case] given: Vec<&str>, #[case] expected: Vec<&str>) {
        let settings = Settings {
            prefixes: given.into_iter().map(String::from).collect(),
            ..Settings::default()
        };
        let settings = Settings {
            access_key: "a".to_string(),
            secret_key: "s".to_string(),
            bucket: "b".to_string(),
            ..settings
        };
        assert_eq!(settings.validate().unwrap().prefixes, expected);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = Settings {
            secret_key: "hunter2".to_string(),
            ..Settings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
