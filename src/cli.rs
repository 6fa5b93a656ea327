//! Command-line interface.

use clap::{ArgAction, Parser};
use ctfix_config::Overrides;

/// Fixes the content-type of assets on S3.
///
/// Every flag can also be given as a `CTFIX_`-prefixed environment variable
/// (`CTFIX_SECRET_KEY`, `CTFIX_BUCKET`, ...); flags win.
#[derive(Debug, Parser)]
#[command(name = "ctfix", version, about, long_about = None)]
pub struct Cli {
    /// The AWS access key
    #[arg(long, short = 'a')]
    pub access_key: Option<String>,
    /// The AWS secret key
    #[arg(long, short = 's')]
    pub secret_key: Option<String>,
    /// The S3 bucket to check
    #[arg(long, short = 'b')]
    pub bucket: Option<String>,
    /// File path prefixes to check (default: the whole bucket)
    #[arg(long, short = 'p', num_args = 0.., action = ArgAction::Append)]
    pub prefixes: Option<Vec<String>>,
    /// The number of workers [default: 4]
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,
    /// Verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
    /// Add this for a dry run (don't change any file)
    #[arg(long = "dryrun", visible_alias = "dry-run", short = 'd')]
    pub dry_run: bool,
    /// Bucket region [default: ap-northeast-1]
    #[arg(long, short = 'r')]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services
    #[arg(long, short = 'e')]
    pub endpoint: Option<String>,
    /// Seconds an idle worker waits for work before exiting [default: 3600]
    #[arg(long, value_name = "SECONDS")]
    pub queue_timeout: Option<u64>,
}

impl Cli {
    /// Flags actually given, as the top settings layer.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            prefixes: self.prefixes.clone(),
            workers: self.workers,
            verbose: self.verbose.then_some(true),
            dry_run: self.dry_run.then_some(true),
            queue_timeout: self.queue_timeout,
        }
    }
}
