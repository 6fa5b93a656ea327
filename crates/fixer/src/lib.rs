//! Audits the declared media type of stored objects and repairs it in place.
//!
//! A run is a small producer/consumer pipeline:
//!
//! 1. [`candidates`] lists every configured prefix and merges the keys into
//!    one deduplicated set.
//! 2. The [`Coordinator`] starts a fixed pool of [`Worker`]s sharing one
//!    bounded [queue](crate::queue), feeds every key into it, then one
//!    [`Entry::Stop`](queue::Entry::Stop) per worker.
//! 3. Each worker fetches the object's metadata, compares its declared type
//!    with the one a [`TypeGuesser`] infers from the key, and rewrites the
//!    metadata in place when they disagree (unless this is a dry run).
//!
//! Every per-key result is an [`Outcome`] handed to a [`Reporter`]; none of
//! them aborts the run.

mod coordinator;
mod enumerate;
pub mod error;
mod infer;
mod outcome;
pub mod queue;
mod worker;

pub use crate::coordinator::{Coordinator, RunConfig};
pub use crate::enumerate::candidates;
pub use crate::infer::{ExtensionGuesser, TypeGuesser};
pub use crate::outcome::{FixDecision, Outcome, Reporter, RunSummary};
pub use crate::worker::{FixOptions, Worker, WorkerExit, decide};
