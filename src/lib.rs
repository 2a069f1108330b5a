//! Group-by aggregation execution core: split-partitioned workers streaming
//! per-(field, term, group) statistics over one socket per split.
//!
//! ## Scope
//! This crate decides *which worker processes which split* and *how results
//! are framed and buffered on the wire*. It does not decide what statistics
//! to compute or how terms are parsed from storage: term providers, the
//! per-group aggregation session, and the task-iterator implementation are
//! external collaborators consumed through traits.
//!
//! ## Key invariants
//! - The split partition covers `[0, num_splits)` exactly once, contiguous
//!   and sorted, with per-worker range sizes differing by at most one; an
//!   empty range is valid work-free output, never an error.
//! - Within one worker, task iterators interleave cooperatively in fair
//!   round-robin; no task is starved and none is invoked after exhaustion.
//! - Each stream's previous-term cache enables delta framing; a type change
//!   or a fresh stream always emits a full frame.
//! - Per-stream socket failures are captured locally and degrade that split
//!   only; construction failures are fatal to the whole run.
//!
//! ## Flow (one pass)
//! `FtgsRunner` -> `SplitRanges` partition -> N `Worker`s, each owning a
//! slice of task iterators bound to sockets -> each task pulls terms from
//! its split's sources, updates the shared session, and writes delta-framed
//! output through its `OutputStream`.
//!
//! ## Notable entry points
//! - [`FtgsRunner`]: builds providers once, dispatches workers in parallel.
//! - [`Worker`] / [`TaskIterator`]: the cooperative multiplexing loop and
//!   the contract it drives.
//! - [`OutputStream`] / [`BufferedSocket`]: delta framing and buffered,
//!   error-capturing socket writes.
//! - [`SplitRanges`]: the deterministic split partition.

pub mod context;
pub mod executor;
pub mod providers;
pub mod runner;
pub mod shard;
pub mod socket;
pub mod split;
pub mod stream;
pub mod task;
pub mod term;
pub mod worker;

pub use context::{AggregateConfig, PackedTablePtr, SessionContext, WorkerContext};
pub use executor::{ExecutorService, ThreadExecutor};
pub use providers::{ProviderError, ProviderFactory, TermProvider, TermProviders, TermSource};
pub use runner::{FtgsRunner, RunError, RunStats};
pub use shard::{Shard, ShardError};
pub use socket::{BufferedSocket, RuntimeError, DEFAULT_BUFFER_SIZE};
pub use split::{SplitRange, SplitRanges};
pub use stream::OutputStream;
pub use task::{TaskBuildError, TaskFactory, TaskIterator, TaskSpec};
pub use term::{Term, TermRef, TermType};
pub use worker::Worker;
