use crate::enumerate::candidates;
use crate::error::Result;
use crate::infer::TypeGuesser;
use crate::outcome::{Reporter, RunSummary};
use crate::queue::{self, Entry};
use crate::worker::{FixOptions, Worker};
use ctfix_storage::StoreHandle;
use ctfix_storage::backend::ReadOnlyBackend;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Parameters for one complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Key prefixes to audit; empty means the whole bucket.
    pub prefixes: Vec<String>,
    /// Number of concurrent fix workers (at least one is always started).
    pub workers: usize,
    /// Pending entries buffered before feeding the queue has to wait.
    pub queue_capacity: usize,
    pub options: FixOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            prefixes: vec![String::new()],
            workers: 4,
            queue_capacity: queue::DEFAULT_CAPACITY,
            options: FixOptions::default(),
        }
    }
}

/// Orchestrates a run: enumerate, start the worker pool, feed it, and wait.
pub struct Coordinator {
    store: StoreHandle,
    guesser: Arc<dyn TypeGuesser>,
    reporter: Arc<dyn Reporter>,
}

impl Coordinator {
    pub fn new(store: StoreHandle, guesser: Arc<dyn TypeGuesser>, reporter: Arc<dyn Reporter>) -> Self {
        Self { store, guesser, reporter }
    }

    /// Run to completion without listening for interrupts.
    pub async fn run(&self, config: &RunConfig) -> Result<RunSummary> {
        self.run_until_interrupted(config, std::future::pending::<()>()).await
    }

    /// Run to completion, absorbing `interrupt` whenever it fires.
    ///
    /// The interrupt is watched from the start of the run. Before anything
    /// is queued it ends the run right away. While keys are being fed it
    /// stops feeding: keys already queued are still processed and the rest
    /// are counted as unqueued. While waiting it only marks the summary as
    /// interrupted. Workers always finish the key they are on and then run
    /// to their sentinel.
    ///
    /// Enumeration failure is the only error: every per-key failure is
    /// reported and counted instead.
    pub async fn run_until_interrupted(
        &self,
        config: &RunConfig,
        interrupt: impl Future<Output = ()>,
    ) -> Result<RunSummary> {
        let mut interrupt = std::pin::pin!(interrupt);
        let keys = tokio::select! {
            biased;
            () = &mut interrupt => {
                tracing::warn!("Interrupt received while listing; nothing was queued");
                return Ok(RunSummary { interrupted: true, ..RunSummary::default() });
            },
            keys = candidates(self.store.as_ref(), &config.prefixes) => keys?,
        };
        let workers = config.workers.max(1);
        let mut summary = RunSummary {
            candidates: keys.len(),
            ..RunSummary::default()
        };
        tracing::info!(
            bucket = self.store.bucket(),
            candidates = keys.len(),
            workers,
            dry_run = config.options.dry_run,
            "Starting content type audit"
        );

        let store: StoreHandle = match config.options.dry_run {
            true => Arc::new(ReadOnlyBackend::new(self.store.clone())),
            false => self.store.clone(),
        };
        let (producer, consumer) = queue::channel(config.queue_capacity);
        let mut pool = JoinSet::new();
        for id in 0..workers {
            let worker = Worker::new(id, store.clone(), self.guesser.clone(), self.reporter.clone(), config.options);
            pool.spawn(worker.run(consumer.clone()));
        }
        drop(consumer);

        let total = keys.len();
        for (queued, key) in keys.into_iter().enumerate() {
            let pushed = tokio::select! {
                biased;
                () = &mut interrupt => {
                    summary.interrupted = true;
                    summary.unqueued = total - queued;
                    tracing::warn!(unqueued = summary.unqueued, "Interrupt received; no more keys will be queued");
                    break;
                },
                pushed = producer.push(Entry::Key(key)) => pushed,
            };
            if pushed.is_err() {
                summary.unqueued = total - queued;
                tracing::warn!(unqueued = summary.unqueued, "Every worker has exited; remaining keys were not queued");
                break;
            }
        }
        let stopped = producer.stop(workers).await;
        if stopped < workers {
            tracing::debug!(stopped, workers, "Not every stop signal could be delivered");
        }
        drop(producer);

        loop {
            tokio::select! {
                biased;
                () = &mut interrupt, if !summary.interrupted => {
                    tracing::warn!(remaining = pool.len(), "Interrupt received; waiting for workers to finish");
                    summary.interrupted = true;
                },
                joined = pool.join_next() => match joined {
                    Some(Ok((_exit, worker_summary))) => summary.merge(&worker_summary),
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "Worker aborted");
                        summary.workers_aborted += 1;
                    },
                    None => break,
                },
            }
        }

        tracing::info!(
            processed = summary.processed(),
            fixed = summary.fixed,
            would_fix = summary.would_fix,
            failures = summary.failures(),
            interrupted = summary.interrupted,
            "Content type audit finished"
        );
        Ok(summary)
    }
}
