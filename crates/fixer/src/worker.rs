//! Fix workers: drain the queue, compare declared against inferred media
//! types, and rewrite metadata where they disagree.

use crate::infer::TypeGuesser;
use crate::outcome::{FixDecision, Outcome, Reporter, RunSummary};
use crate::queue::{Consumer, Dequeued, Entry};
use ctfix_storage::{StoreHandle, is_directory_marker};
use std::sync::Arc;
use std::time::Duration;

/// Behaviour shared by every worker in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOptions {
    /// Also report keys whose declared type already matches.
    pub verbose: bool,
    /// Compare and report, but never rewrite.
    pub dry_run: bool,
    /// How long an idle worker waits on the queue before exiting.
    pub queue_timeout: Duration,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            dry_run: false,
            queue_timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// How a worker's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Received its sentinel.
    Stopped,
    /// Waited past the queue timeout without receiving anything.
    TimedOut,
    /// The queue was closed and drained without a sentinel.
    Closed,
}

/// Compare a declared media type with the inferred one.
///
/// Exact string comparison; an object with no declared type never matches.
pub fn decide(current: Option<&str>, expected: &str) -> FixDecision {
    match current {
        Some(current) if current == expected => FixDecision::Match,
        _ => FixDecision::Fix,
    }
}

/// One member of the worker pool.
///
/// Holds nothing mutable that is shared with other workers; per-key counts
/// are accumulated locally and handed back when the loop ends.
pub struct Worker {
    id: usize,
    store: StoreHandle,
    guesser: Arc<dyn TypeGuesser>,
    reporter: Arc<dyn Reporter>,
    options: FixOptions,
}

impl Worker {
    pub fn new(
        id: usize,
        store: StoreHandle,
        guesser: Arc<dyn TypeGuesser>,
        reporter: Arc<dyn Reporter>,
        options: FixOptions,
    ) -> Self {
        Self { id, store, guesser, reporter, options }
    }

    /// Process entries until a sentinel arrives, the queue closes, or the
    /// queue stays idle past the configured timeout.
    pub async fn run(self, queue: Consumer) -> (WorkerExit, RunSummary) {
        let mut summary = RunSummary::default();
        tracing::debug!(worker = self.id, "Worker started");
        let exit = loop {
            match queue.next(self.options.queue_timeout).await {
                Dequeued::Entry(Entry::Stop) => break WorkerExit::Stopped,
                Dequeued::Entry(Entry::Key(key)) => match self.process(&key).await {
                    Some(outcome) => summary.record(&outcome),
                    None => summary.directories += 1,
                },
                Dequeued::TimedOut => {
                    tracing::warn!(
                        worker = self.id,
                        timeout = ?self.options.queue_timeout,
                        "No work received before timeout; worker exiting without a stop signal"
                    );
                    break WorkerExit::TimedOut;
                },
                Dequeued::Closed => {
                    tracing::warn!(worker = self.id, "Queue closed without a stop signal; worker exiting");
                    break WorkerExit::Closed;
                },
            }
        };
        match exit {
            WorkerExit::Stopped => summary.workers_stopped += 1,
            WorkerExit::TimedOut => summary.workers_timed_out += 1,
            WorkerExit::Closed => summary.workers_closed += 1,
        }
        tracing::debug!(worker = self.id, processed = summary.processed(), "Worker finished");
        (exit, summary)
    }

    /// Compare-and-fix a single key, reporting as it goes.
    ///
    /// Returns the key's final outcome, or `None` for directory markers,
    /// which are skipped without any store call and without a report. A
    /// wrong type is reported as [`Outcome::Mismatch`] before the rewrite is
    /// attempted (or skipped, in a dry run).
    pub async fn process(&self, key: &str) -> Option<Outcome> {
        if is_directory_marker(key) {
            tracing::trace!(worker = self.id, key, decision = ?FixDecision::SkipDirectory, "Skipping directory marker");
            return None;
        }

        let current = match self.store.head(key).await {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::debug!(worker = self.id, key, error = %*err, "Metadata lookup failed");
                return Some(self.report(key, Outcome::LookupFailed(err.to_string())));
            },
        };

        let Some(expected) = self.guesser.guess(key) else {
            return Some(self.report(key, Outcome::UnknownType));
        };

        let declared = current.content_type.clone();
        if decide(declared.as_deref(), &expected) == FixDecision::Match {
            tracing::trace!(worker = self.id, key, content_type = %expected, "Content type matches");
            if self.options.verbose {
                self.reporter.report(key, &Outcome::Matched);
            }
            return Some(Outcome::Matched);
        }

        self.report(key, Outcome::Mismatch { current: declared.clone(), expected: expected.clone() });
        if self.options.dry_run {
            return Some(Outcome::WouldFix { current: declared, expected });
        }

        let replacement = current.replacement(&expected);
        match self.store.replace_metadata(key, &replacement).await {
            Ok(()) => {
                tracing::debug!(worker = self.id, key, from = ?declared, to = %expected, "Content type rewritten");
                Some(Outcome::Fixed { current: declared, expected })
            },
            Err(err) => Some(self.report(
                key,
                Outcome::RewriteFailed {
                    current: declared,
                    expected,
                    reason: err.to_string(),
                },
            )),
        }
    }

    fn report(&self, key: &str, outcome: Outcome) -> Outcome {
        self.reporter.report(key, &outcome);
        outcome
    }
}
