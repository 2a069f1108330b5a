//! Per-worker task multiplexing.
//!
//! A worker owns one contiguous range of task iterators, one per assigned
//! split, and drives them all to exhaustion on its own thread with fair
//! round-robin interleaving. Tasks never run concurrently with each other
//! within one worker; suspension between them is explicit and voluntary
//! (each `invoke` does a bounded increment and returns to the loop).

use std::os::unix::io::RawFd;
use std::sync::Arc;

use tracing::debug;

use crate::context::{AggregateConfig, SessionContext, WorkerContext};
use crate::providers::TermProviders;
use crate::split::SplitRanges;
use crate::task::{TaskBuildError, TaskFactory, TaskIterator, TaskSpec};

/// One worker: a contiguous slice of the split space and its task iterators.
pub struct Worker {
    ctx: Arc<WorkerContext>,
    session: Arc<SessionContext>,
    tasks: Vec<Box<dyn TaskIterator + Send>>,
}

impl Worker {
    /// Builds the worker's descriptor and one task per assigned split, in
    /// split order.
    ///
    /// An empty split range builds zero tasks; [`Worker::run`] then returns
    /// at once.
    ///
    /// # Errors
    /// Task construction failure is fatal to the run.
    ///
    /// # Panics
    /// Panics if a split in the assigned range has no socket descriptor.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        ranges: &SplitRanges,
        config: &AggregateConfig,
        session: Arc<SessionContext>,
        socket_fds: &[RawFd],
        int_providers: &TermProviders,
        str_providers: &TermProviders,
        factory: &dyn TaskFactory,
    ) -> Result<Self, TaskBuildError> {
        let ctx = Arc::new(WorkerContext::new(id, *config, socket_fds));
        let range = ranges.splits_for(id);
        debug!(worker = id, range = %range, "assigning splits");

        let mut tasks = Vec::with_capacity(range.len());
        for split in range.splits() {
            let spec = TaskSpec {
                worker: Arc::clone(&ctx),
                session: Arc::clone(&session),
                split,
                socket_fd: socket_fds[split],
                int_providers,
                str_providers,
            };
            tasks.push(factory.build(spec)?);
        }
        debug!(worker = id, tasks = tasks.len(), "worker constructed");

        Ok(Self {
            ctx,
            session,
            tasks,
        })
    }

    /// Dense worker id.
    #[inline]
    pub fn id(&self) -> usize {
        self.ctx.id()
    }

    /// Task iterators still owned (before `run`, one per assigned split).
    #[inline]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Shared session handle; kept alive until the worker is dropped.
    #[inline]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Drives every task to exhaustion with fair round-robin interleaving.
    ///
    /// Each pass over the list gives every still-active task exactly one
    /// bounded increment. Exhausted tasks are removed in place, preserving
    /// the relative order of the remainder, and are never invoked again.
    /// Returns when the list is empty.
    pub fn run(&mut self) {
        let mut cursor = 0;
        while !self.tasks.is_empty() {
            if cursor >= self.tasks.len() {
                cursor = 0;
            }
            if self.tasks[cursor].is_exhausted() {
                // Removal shifts the tail left, so the cursor already points
                // at the next candidate (or past the end, wrapping above).
                self.tasks.remove(cursor);
            } else {
                let task = &mut self.tasks[cursor];
                task.invoke();
                task.advance();
                cursor += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PackedTablePtr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted task: a fixed number of invocations, logged to a shared trace.
    struct Scripted {
        label: usize,
        remaining: usize,
        trace: Arc<Mutex<Vec<usize>>>,
    }

    impl TaskIterator for Scripted {
        fn is_exhausted(&self) -> bool {
            self.remaining == 0
        }

        fn invoke(&mut self) {
            assert!(self.remaining > 0, "invoked after exhaustion");
            self.trace.lock().unwrap().push(self.label);
        }

        fn advance(&mut self) {
            self.remaining -= 1;
        }
    }

    struct ScriptedFactory {
        /// Invocation budget per split index.
        budgets: Vec<usize>,
        trace: Arc<Mutex<Vec<usize>>>,
        built: AtomicUsize,
    }

    impl TaskFactory for ScriptedFactory {
        fn build(
            &self,
            spec: TaskSpec<'_>,
        ) -> Result<Box<dyn TaskIterator + Send>, TaskBuildError> {
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Scripted {
                label: spec.split,
                remaining: self.budgets[spec.split],
                trace: Arc::clone(&self.trace),
            }))
        }
    }

    fn config() -> AggregateConfig {
        AggregateConfig {
            num_groups: 2,
            num_metrics: 1,
            only_binary_metrics: false,
        }
    }

    fn session() -> Arc<SessionContext> {
        Arc::new(SessionContext::new(config(), PackedTablePtr::null()))
    }

    fn build_worker(id: usize, ranges: &SplitRanges, budgets: Vec<usize>) -> (Worker, Arc<Mutex<Vec<usize>>>) {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let fds: Vec<i32> = (0..budgets.len() as i32).collect();
        let factory = ScriptedFactory {
            budgets,
            trace: Arc::clone(&trace),
            built: AtomicUsize::new(0),
        };
        let worker = Worker::new(
            id,
            ranges,
            &config(),
            session(),
            &fds,
            &TermProviders::empty(),
            &TermProviders::empty(),
            &factory,
        )
        .unwrap();
        (worker, trace)
    }

    #[test]
    fn every_task_invoked_exactly_its_budget() {
        let ranges = SplitRanges::new(3, 1);
        let (mut worker, trace) = build_worker(0, &ranges, vec![3, 1, 2]);
        assert_eq!(worker.task_count(), 3);

        worker.run();
        assert_eq!(worker.task_count(), 0);

        let trace = trace.lock().unwrap();
        assert_eq!(trace.iter().filter(|&&l| l == 0).count(), 3);
        assert_eq!(trace.iter().filter(|&&l| l == 1).count(), 1);
        assert_eq!(trace.iter().filter(|&&l| l == 2).count(), 2);
    }

    #[test]
    fn rotation_is_fair_round_robin() {
        let ranges = SplitRanges::new(3, 1);
        let (mut worker, trace) = build_worker(0, &ranges, vec![3, 3, 3]);

        worker.run();

        // Equal budgets: strict rotation, pass after pass.
        let trace = trace.lock().unwrap();
        assert_eq!(*trace, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn exhausted_tasks_drop_out_without_starving_the_rest() {
        let ranges = SplitRanges::new(3, 1);
        let (mut worker, trace) = build_worker(0, &ranges, vec![1, 4, 2]);

        worker.run();

        let trace = trace.lock().unwrap();
        // Task 0 leaves after pass one, task 2 after pass two; task 1 keeps
        // its slot in order throughout.
        assert_eq!(*trace, vec![0, 1, 2, 1, 2, 1, 1]);
    }

    #[test]
    fn zero_budget_task_is_never_invoked() {
        let ranges = SplitRanges::new(2, 1);
        let (mut worker, trace) = build_worker(0, &ranges, vec![0, 2]);

        worker.run();

        let trace = trace.lock().unwrap();
        assert_eq!(*trace, vec![1, 1]);
    }

    #[test]
    fn empty_range_builds_no_tasks_and_run_returns() {
        // 5 workers over 3 splits: workers 3 and 4 get empty ranges.
        let ranges = SplitRanges::new(3, 5);
        let trace = Arc::new(Mutex::new(Vec::new()));
        let factory = ScriptedFactory {
            budgets: vec![1, 1, 1],
            trace: Arc::clone(&trace),
            built: AtomicUsize::new(0),
        };
        let mut worker = Worker::new(
            4,
            &ranges,
            &config(),
            session(),
            &[0, 1, 2],
            &TermProviders::empty(),
            &TermProviders::empty(),
            &factory,
        )
        .unwrap();

        assert_eq!(worker.task_count(), 0);
        assert_eq!(factory.built.load(Ordering::SeqCst), 0);
        worker.run();
        assert!(trace.lock().unwrap().is_empty());
    }

    #[test]
    fn failing_factory_aborts_construction() {
        struct Failing;
        impl TaskFactory for Failing {
            fn build(
                &self,
                _spec: TaskSpec<'_>,
            ) -> Result<Box<dyn TaskIterator + Send>, TaskBuildError> {
                Err(TaskBuildError::Other("no task for you".to_string()))
            }
        }

        let ranges = SplitRanges::new(2, 1);
        let result = Worker::new(
            0,
            &ranges,
            &config(),
            session(),
            &[0, 1],
            &TermProviders::empty(),
            &TermProviders::empty(),
            &Failing,
        );
        assert!(result.is_err());
    }
}
