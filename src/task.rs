//! Task iterator contract.
//!
//! A task iterator is one split's resumable output job: each `invoke` pulls
//! the next term(s) from the split's term sources, updates the shared
//! session state, and writes framed output, then yields back to the owning
//! worker's round-robin loop. "Suspension" is voluntary: an invocation does
//! a bounded amount of work and returns; it never blocks on I/O beyond the
//! accepted socket backpressure.
//!
//! The implementation lives outside this crate; only the contract below is
//! consumed, plus the [`TaskFactory`] seam the worker uses to build one task
//! per assigned split.

use std::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::sync::Arc;

use crate::context::{SessionContext, WorkerContext};
use crate::providers::TermProviders;

/// One split's resumable output job.
pub trait TaskIterator {
    /// True once the task has no more work. A true result is permanent.
    fn is_exhausted(&self) -> bool;

    /// Performs one bounded increment of work.
    ///
    /// Never called after [`Self::is_exhausted`] reports true. Socket
    /// failures are captured on the task's stream; they must not panic the
    /// worker.
    fn invoke(&mut self);

    /// Advances the task's internal position after an `invoke`.
    ///
    /// Every `advance` makes monotonic progress toward exhaustion.
    fn advance(&mut self);
}

/// Everything a factory needs to build one split's task.
///
/// The provider registries are borrowed: a task obtains its owned per-split
/// sources from them at build time and retains no reference afterwards. The
/// contexts are shared handles the task keeps for its lifetime.
pub struct TaskSpec<'a> {
    /// Owning worker's descriptor.
    pub worker: Arc<WorkerContext>,
    /// Shared per-run session.
    pub session: Arc<SessionContext>,
    /// Split index this task covers.
    pub split: usize,
    /// Socket descriptor carrying this split's results.
    pub socket_fd: RawFd,
    /// Integer-field term providers.
    pub int_providers: &'a TermProviders,
    /// String-field term providers.
    pub str_providers: &'a TermProviders,
}

/// Builds one task per assigned split. External seam.
pub trait TaskFactory: Send + Sync {
    /// Builds the task for `spec`.
    ///
    /// # Errors
    /// A failure here is fatal to the whole run.
    fn build(&self, spec: TaskSpec<'_>) -> Result<Box<dyn TaskIterator + Send>, TaskBuildError>;
}

/// Fatal task-construction failure.
#[derive(Debug)]
#[non_exhaustive]
pub enum TaskBuildError {
    /// I/O failure while binding the split's resources.
    Io(io::Error),
    /// A provider rejected the split.
    Provider { field: String, detail: String },
    /// Any other factory-specific failure.
    Other(String),
}

impl fmt::Display for TaskBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Provider { field, detail } => {
                write!(f, "provider rejected field {field}: {detail}")
            }
            Self::Other(detail) => write!(f, "task construction failed: {detail}"),
        }
    }
}

impl std::error::Error for TaskBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TaskBuildError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
