//! Per-key outcomes, reporting, and run totals.

use std::fmt;

/// What the compare step decided for a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixDecision {
    /// Declared type already equals the inferred type.
    Match,
    /// Declared type differs and should be rewritten.
    Fix,
    /// Key is a pseudo-directory marker.
    SkipDirectory,
    /// Object metadata could not be fetched.
    SkipUnlookupable,
    /// No media type could be inferred from the key.
    SkipUnguessable,
}

/// What happened to one key.
///
/// Workers report [`Mismatch`](Self::Mismatch) as soon as a wrong type is
/// found, before any rewrite is attempted, so live and dry runs print the
/// same lines. [`Fixed`](Self::Fixed) and [`WouldFix`](Self::WouldFix) are
/// the final results of that key and only feed the [`RunSummary`]; a failed
/// rewrite is reported on top of the mismatch as
/// [`RewriteFailed`](Self::RewriteFailed).
///
/// Directory markers never produce an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Declared type matches the inferred type; nothing to do.
    Matched,
    /// Declared type differs from the inferred type.
    Mismatch { current: Option<String>, expected: String },
    /// Declared type was wrong and has been rewritten.
    Fixed { current: Option<String>, expected: String },
    /// Declared type is wrong; left untouched because this is a dry run.
    WouldFix { current: Option<String>, expected: String },
    /// Object metadata could not be fetched.
    LookupFailed(String),
    /// No media type could be inferred from the key.
    UnknownType,
    /// Declared type is wrong, but the metadata-replacing copy failed.
    RewriteFailed { current: Option<String>, expected: String, reason: String },
}

impl Outcome {
    pub fn decision(&self) -> FixDecision {
        match self {
            Self::Matched => FixDecision::Match,
            Self::Mismatch { .. } | Self::Fixed { .. } | Self::WouldFix { .. } | Self::RewriteFailed { .. } => {
                FixDecision::Fix
            },
            Self::LookupFailed(_) => FixDecision::SkipUnlookupable,
            Self::UnknownType => FixDecision::SkipUnguessable,
        }
    }

    /// Whether this outcome belongs on the error stream.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::LookupFailed(_) | Self::UnknownType | Self::RewriteFailed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => write!(f, "Matches expected content type"),
            Self::Mismatch { current, expected } | Self::Fixed { current, expected } | Self::WouldFix { current, expected } => {
                write!(
                    f,
                    "Current content type ({}) does not match expected ({expected}); fixing",
                    current.as_deref().unwrap_or("none")
                )
            },
            Self::LookupFailed(reason) => write!(f, "Could not lookup ({reason})"),
            Self::UnknownType => write!(f, "Could not guess content type"),
            Self::RewriteFailed { reason, .. } => write!(f, "Failed to rewrite metadata: {reason}"),
        }
    }
}

/// Receives outcomes from fix workers as they happen.
///
/// Called concurrently from every worker; implementations must not assume
/// any ordering between keys.
pub trait Reporter: Send + Sync {
    fn report(&self, key: &str, outcome: &Outcome);
}

/// Totals for one run, merged from every worker's local counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct keys found across all prefixes
    pub candidates: usize,
    /// Keys never handed to a worker (every worker had already exited)
    pub unqueued: usize,
    pub directories: usize,
    pub matched: usize,
    pub fixed: usize,
    pub would_fix: usize,
    pub lookup_failed: usize,
    pub unknown_type: usize,
    pub rewrite_failed: usize,
    /// Workers that stopped on a sentinel
    pub workers_stopped: usize,
    /// Workers that gave up waiting on an idle queue
    pub workers_timed_out: usize,
    /// Workers that found the queue closed without a sentinel
    pub workers_closed: usize,
    /// Workers that panicked
    pub workers_aborted: usize,
    /// An interrupt arrived during the run
    pub interrupted: bool,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Matched => self.matched += 1,
            // Announcement only; the key's final result is recorded separately
            Outcome::Mismatch { .. } => {},
            Outcome::Fixed { .. } => self.fixed += 1,
            Outcome::WouldFix { .. } => self.would_fix += 1,
            Outcome::LookupFailed(_) => self.lookup_failed += 1,
            Outcome::UnknownType => self.unknown_type += 1,
            Outcome::RewriteFailed { .. } => self.rewrite_failed += 1,
        }
    }

    /// Keys that were dequeued and handled by a worker.
    pub fn processed(&self) -> usize {
        self.directories
            + self.matched
            + self.fixed
            + self.would_fix
            + self.lookup_failed
            + self.unknown_type
            + self.rewrite_failed
    }

    /// Keys that ended in a reported failure.
    pub fn failures(&self) -> usize {
        self.lookup_failed + self.unknown_type + self.rewrite_failed
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.candidates += other.candidates;
        self.unqueued += other.unqueued;
        self.directories += other.directories;
        self.matched += other.matched;
        self.fixed += other.fixed;
        self.would_fix += other.would_fix;
        self.lookup_failed += other.lookup_failed;
        self.unknown_type += other.unknown_type;
        self.rewrite_failed += other.rewrite_failed;
        self.workers_stopped += other.workers_stopped;
        self.workers_timed_out += other.workers_timed_out;
        self.workers_closed += other.workers_closed;
        self.workers_aborted += other.workers_aborted;
        self.interrupted |= other.interrupted;
    }
}
