//! Top-level FTGS orchestration.
//!
//! The runner builds term providers once per run, computes the
//! split-to-worker partition, constructs one worker per slot, and dispatches
//! every worker through the submission service in parallel. Workers share
//! nothing but the session context, so parallel dispatch needs no further
//! coordination; `await_completion` is the only barrier.

use std::fmt;
use std::os::unix::io::RawFd;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::context::{AggregateConfig, PackedTablePtr, SessionContext};
use crate::executor::ExecutorService;
use crate::providers::{ProviderError, ProviderFactory, TermProviders};
use crate::shard::Shard;
use crate::split::SplitRanges;
use crate::task::{TaskBuildError, TaskFactory};
use crate::term::TermType;
use crate::worker::Worker;

/// Orchestrates one FTGS pass: providers, partition, workers, dispatch.
pub struct FtgsRunner {
    shards: Vec<Shard>,
    int_providers: TermProviders,
    str_providers: TermProviders,
    num_splits: usize,
    num_workers: usize,
    executor: Arc<dyn ExecutorService>,
}

impl FtgsRunner {
    /// Builds term providers for both field sets, once for the whole run.
    ///
    /// # Errors
    /// Any provider failure aborts construction; no partial runner escapes.
    ///
    /// # Panics
    /// Panics if `num_splits` or `num_workers` is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shards: Vec<Shard>,
        int_fields: &[String],
        str_fields: &[String],
        split_dir: &Path,
        num_splits: usize,
        num_workers: usize,
        provider_factory: &dyn ProviderFactory,
        executor: Arc<dyn ExecutorService>,
    ) -> Result<Self, RunError> {
        assert!(num_splits > 0, "num_splits must be > 0");
        assert!(num_workers > 0, "num_workers must be > 0");

        let int_providers = provider_factory
            .providers(
                &shards,
                int_fields,
                TermType::Int,
                split_dir,
                num_splits,
                executor.as_ref(),
            )
            .map_err(RunError::Provider)?;
        let str_providers = provider_factory
            .providers(
                &shards,
                str_fields,
                TermType::Str,
                split_dir,
                num_splits,
                executor.as_ref(),
            )
            .map_err(RunError::Provider)?;

        debug!(
            shards = shards.len(),
            int_fields = int_providers.len(),
            str_fields = str_providers.len(),
            num_splits,
            num_workers,
            "runner constructed"
        );

        Ok(Self {
            shards,
            int_providers,
            str_providers,
            num_splits,
            num_workers,
            executor,
        })
    }

    /// Shards this run reads from.
    #[inline]
    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    /// Number of output splits.
    #[inline]
    pub fn num_splits(&self) -> usize {
        self.num_splits
    }

    /// Number of worker slots.
    #[inline]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Performs one full FTGS pass and returns when all workers finish.
    ///
    /// `socket_fds` holds one caller-owned descriptor per split, indexed by
    /// split number. The session is created here, shared by every worker,
    /// and outlives them all.
    ///
    /// # Errors
    /// Construction failures (socket table mismatch, task build) are fatal;
    /// per-stream I/O failures are not; they stay captured on the affected
    /// stream.
    ///
    /// # Panics
    /// Panics if `config` is invalid, or if a dispatched worker panicked.
    pub fn run(
        &self,
        config: &AggregateConfig,
        sample_table: PackedTablePtr,
        socket_fds: &[RawFd],
        task_factory: &dyn TaskFactory,
    ) -> Result<RunStats, RunError> {
        config.validate();
        if socket_fds.len() != self.num_splits {
            return Err(RunError::SocketTableMismatch {
                sockets: socket_fds.len(),
                splits: self.num_splits,
            });
        }

        let ranges = SplitRanges::new(self.num_splits, self.num_workers);
        debug!(ranges = %ranges, "computed split partition");

        let session = Arc::new(SessionContext::new(*config, sample_table));

        let mut stats = RunStats {
            splits: self.num_splits,
            ..RunStats::default()
        };
        let mut workers = Vec::with_capacity(self.num_workers);
        for id in 0..self.num_workers {
            let worker = Worker::new(
                id,
                &ranges,
                config,
                Arc::clone(&session),
                socket_fds,
                &self.int_providers,
                &self.str_providers,
                task_factory,
            )
            .map_err(|source| RunError::TaskBuild { worker: id, source })?;

            stats.tasks += worker.task_count();
            if ranges.splits_for(id).is_empty() {
                stats.empty_ranges += 1;
            }
            workers.push(worker);
        }
        stats.workers = workers.len();

        for mut worker in workers {
            self.executor.submit(Box::new(move || worker.run()));
        }
        self.executor.await_completion();

        debug!(
            workers = stats.workers,
            tasks = stats.tasks,
            empty_ranges = stats.empty_ranges,
            "ftgs pass complete"
        );
        Ok(stats)
    }
}

/// Summary counters for one FTGS pass.
///
/// All counters are always populated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Workers constructed (always the configured worker count).
    pub workers: usize,
    /// Splits covered by the partition.
    pub splits: usize,
    /// Task iterators constructed across all workers.
    pub tasks: usize,
    /// Workers that received an empty split range.
    pub empty_ranges: usize,
}

/// Fatal run failure.
///
/// Per-stream I/O failures never surface here; they are captured on the
/// affected stream and degrade that split only.
#[derive(Debug)]
#[non_exhaustive]
pub enum RunError {
    /// Provider construction failed.
    Provider(ProviderError),
    /// Task construction failed for one worker.
    TaskBuild {
        worker: usize,
        source: TaskBuildError,
    },
    /// The socket table length does not match the split count.
    SocketTableMismatch { sockets: usize, splits: usize },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(err) => write!(f, "provider construction failed: {err}"),
            Self::TaskBuild { worker, source } => {
                write!(f, "task construction failed for worker {worker}: {source}")
            }
            Self::SocketTableMismatch { sockets, splits } => {
                write!(f, "socket table mismatch: {sockets} sockets for {splits} splits")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::TaskBuild { source, .. } => Some(source),
            Self::SocketTableMismatch { .. } => None,
        }
    }
}
