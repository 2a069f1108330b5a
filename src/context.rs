//! Explicit aggregation contexts.
//!
//! Worker and session descriptors are plain structs passed by reference
//! through constructors and call sites, never globals. Their accumulation
//! algorithms live in external aggregation code; this crate only owns their
//! lifetimes: one session per run shared by every worker, one worker
//! descriptor per worker.

use std::os::raw::c_void;
use std::os::unix::io::RawFd;

/// Aggregation parameters for one run.
#[derive(Clone, Copy, Debug)]
pub struct AggregateConfig {
    /// Number of aggregation groups.
    pub num_groups: u32,
    /// Metrics accumulated per group.
    pub num_metrics: u32,
    /// True when every metric is a 0/1 bit metric.
    pub only_binary_metrics: bool,
}

impl AggregateConfig {
    /// Validates the parameters. Panics on invalid values.
    pub fn validate(&self) {
        assert!(self.num_groups > 0, "num_groups must be > 0");
    }
}

/// Opaque pointer to the caller-owned packed sample table.
///
/// # Safety
/// The caller guarantees the table outlives the run and tolerates shared
/// access from every worker under its own synchronization discipline. This
/// crate treats the pointer as a token and never dereferences it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedTablePtr(*mut c_void);

impl PackedTablePtr {
    /// Wraps a caller-provided table pointer.
    #[inline]
    pub fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// A null table, for runs that sample nothing.
    #[inline]
    pub fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// Raw pointer for the external aggregation code.
    #[inline]
    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }
}

// SAFETY: the pointer is an opaque token; all dereferencing happens in
// external aggregation code under the caller's synchronization contract.
unsafe impl Send for PackedTablePtr {}
unsafe impl Sync for PackedTablePtr {}

/// Shared per-run session state.
///
/// Created exactly once per run and shared by reference (`Arc` at the call
/// sites) by every worker; it must not be destroyed until the last worker
/// referencing it is gone, which the `Arc` enforces.
#[derive(Debug)]
pub struct SessionContext {
    config: AggregateConfig,
    sample_table: PackedTablePtr,
}

impl SessionContext {
    /// Builds the session for one run.
    ///
    /// # Panics
    /// Panics if `config` is invalid.
    pub fn new(config: AggregateConfig, sample_table: PackedTablePtr) -> Self {
        config.validate();
        Self {
            config,
            sample_table,
        }
    }

    /// Aggregation parameters for this run.
    #[inline]
    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    /// The caller-owned sample table.
    #[inline]
    pub fn sample_table(&self) -> PackedTablePtr {
        self.sample_table
    }
}

/// Per-worker aggregation descriptor.
///
/// Holds the worker id, the run's aggregation parameters, and the full
/// per-split socket table (a task looks up its own split's descriptor here).
#[derive(Debug)]
pub struct WorkerContext {
    id: usize,
    config: AggregateConfig,
    socket_fds: Vec<RawFd>,
}

impl WorkerContext {
    /// Builds the descriptor for worker `id`.
    ///
    /// # Panics
    /// Panics if `config` is invalid.
    pub fn new(id: usize, config: AggregateConfig, socket_fds: &[RawFd]) -> Self {
        config.validate();
        Self {
            id,
            config,
            socket_fds: socket_fds.to_vec(),
        }
    }

    /// Dense worker id in `[0, num_workers)`.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Aggregation parameters for this run.
    #[inline]
    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    /// Socket descriptors for every split, indexed by split number.
    #[inline]
    pub fn socket_fds(&self) -> &[RawFd] {
        &self.socket_fds
    }

    /// Socket descriptor for one split.
    ///
    /// # Panics
    /// Panics if `split` is outside the socket table.
    #[inline]
    pub fn socket_for(&self, split: usize) -> RawFd {
        self.socket_fds[split]
    }
}
