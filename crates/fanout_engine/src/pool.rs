//! Bounded worker pool that drains a fixed task list.
//!
//! Workers share one dispatch cursor. Checking the termination mode and
//! advancing the cursor happen under the same lock, so a task index is either
//! handed out while the run is still `Running` (and then always executes) or
//! never handed out at all. Dispatch is in index order, which is what gives
//! break its ordering guarantee: dispatch halts at the lowest abandoned index,
//! every lower index has already been handed out, and no higher index ever is.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};

use crate::error::panic_message;
use crate::{
    EngineError, Fetcher, ProgressAggregator, ResultSink, RunOutcome, Task, TaskResult,
    TerminationController, TerminationState,
};

/// Degree of parallelism for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// One worker per available processing unit.
    #[default]
    Available,
    Fixed(NonZeroUsize),
}

impl Parallelism {
    pub fn fixed(workers: usize) -> Self {
        NonZeroUsize::new(workers).map_or(Parallelism::Available, Parallelism::Fixed)
    }

    pub fn resolve(self) -> usize {
        match self {
            Parallelism::Available => thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            Parallelism::Fixed(workers) => workers.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    parallelism: Parallelism,
}

impl WorkerPool {
    pub fn new(parallelism: Parallelism) -> Self {
        Self { parallelism }
    }

    /// Number of workers a run over `task_count` tasks would use.
    pub fn worker_count(&self, task_count: usize) -> usize {
        self.parallelism.resolve().min(task_count).max(1)
    }

    /// Runs every task unless terminated early, blocking until all workers settle.
    ///
    /// `progress` must have been created with `tasks.len()` as its total.
    /// Fetch failures are delivered through `results`; only engine failures
    /// (a panicking worker, a thread that cannot be spawned) return `Err`.
    pub fn run(
        &self,
        tasks: &[Task],
        controller: &TerminationController,
        fetcher: &dyn Fetcher,
        progress: &ProgressAggregator<'_>,
        results: &dyn ResultSink,
    ) -> Result<RunOutcome, EngineError> {
        if tasks.is_empty() {
            return Ok(RunOutcome::CompletedAll);
        }
        debug_assert_eq!(progress.total(), tasks.len());

        let workers = self.worker_count(tasks.len());
        let dispatcher = Dispatcher::default();
        let run_id = engine_logging::current_run_id();
        engine_info!("dispatching {} tasks across {} workers", tasks.len(), workers);

        let panic = thread::scope(|scope| -> Result<Option<EngineError>, EngineError> {
            let mut handles = Vec::with_capacity(workers);
            for worker in 0..workers {
                let ctx = WorkerContext {
                    worker,
                    tasks,
                    controller,
                    fetcher,
                    progress,
                    results,
                    dispatcher: &dispatcher,
                };
                let spawned = thread::Builder::new()
                    .name(format!("fanout-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        engine_logging::set_run_id(run_id);
                        ctx.run();
                    });
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(err) => {
                        // Workers already running see the halt after their current task.
                        dispatcher.fail();
                        for (_, handle) in handles {
                            let _ = handle.join();
                        }
                        return Err(EngineError::Spawn(err));
                    }
                }
            }

            let mut first_panic = None;
            for (worker, handle) in handles {
                if let Err(payload) = handle.join() {
                    let message = panic_message(payload.as_ref());
                    engine_warn!("worker {} panicked: {}", worker, message);
                    first_panic.get_or_insert(EngineError::WorkerPanicked { worker, message });
                }
            }
            Ok(first_panic)
        })?;

        if let Some(err) = panic {
            return Err(err);
        }

        let outcome = dispatcher.classify(tasks.len())?;
        engine_debug!(
            "pool settled: {:?} ({} of {} executed)",
            outcome,
            dispatcher.executed(),
            tasks.len()
        );
        Ok(outcome)
    }
}

#[derive(Debug, Default)]
struct DispatchState {
    next: usize,
    saw_cancel: bool,
    saw_stop: bool,
    lowest_break: Option<usize>,
    failed: bool,
}

#[derive(Debug, Default)]
struct Dispatcher {
    state: Mutex<DispatchState>,
    executed: AtomicUsize,
}

impl Dispatcher {
    fn lock(&self) -> std::sync::MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands out the next index, or `None` once the list is drained or the run halted.
    fn next_task(&self, controller: &TerminationController, total: usize) -> Option<usize> {
        let mut state = self.lock();
        if state.failed || state.next >= total {
            return None;
        }
        match controller.current_mode() {
            TerminationState::Running => {
                let index = state.next;
                state.next += 1;
                Some(index)
            }
            TerminationState::CancelRequested => {
                state.saw_cancel = true;
                None
            }
            TerminationState::StopRequested => {
                state.saw_stop = true;
                None
            }
            TerminationState::BreakRequested => {
                let next = state.next;
                state.lowest_break.get_or_insert(next);
                None
            }
        }
    }

    /// A cancel that lands while a task is in flight still cancels the run,
    /// even when no index is left to dispatch.
    fn observe_after_fetch(&self, controller: &TerminationController) {
        if controller.is_cancelled() {
            self.lock().saw_cancel = true;
        }
    }

    fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::AcqRel);
    }

    fn executed(&self) -> usize {
        self.executed.load(Ordering::Acquire)
    }

    fn fail(&self) {
        self.lock().failed = true;
    }

    fn classify(&self, total: usize) -> Result<RunOutcome, EngineError> {
        let executed = self.executed();
        let state = self.lock();
        if state.saw_cancel {
            Ok(RunOutcome::Cancelled)
        } else if executed == total {
            Ok(RunOutcome::CompletedAll)
        } else if let Some(index) = state.lowest_break {
            Ok(RunOutcome::BrokenEarly(index))
        } else if state.saw_stop {
            Ok(RunOutcome::StoppedEarly)
        } else {
            Err(EngineError::IncompleteRun { executed, total })
        }
    }
}

/// Halts dispatch for the remaining workers if this one unwinds.
struct HaltOnPanic<'a> {
    dispatcher: &'a Dispatcher,
}

impl Drop for HaltOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.dispatcher.fail();
        }
    }
}

struct WorkerContext<'a, 'p> {
    worker: usize,
    tasks: &'a [Task],
    controller: &'a TerminationController,
    fetcher: &'a dyn Fetcher,
    progress: &'a ProgressAggregator<'p>,
    results: &'a dyn ResultSink,
    dispatcher: &'a Dispatcher,
}

impl WorkerContext<'_, '_> {
    fn run(self) {
        let _guard = HaltOnPanic {
            dispatcher: self.dispatcher,
        };
        let cancel = self.controller.cancel_token();
        let mut handled = 0usize;

        while let Some(index) = self.dispatcher.next_task(self.controller, self.tasks.len()) {
            let task = &self.tasks[index];
            engine_trace!("worker {} fetching #{} {}", self.worker, index, task);

            let result = self.fetcher.fetch(task, &cancel);
            self.dispatcher.observe_after_fetch(self.controller);
            if let Err(err) = &result {
                engine_debug!("task #{} {} failed: {}", index, task, err);
            }

            self.results.deliver(TaskResult {
                index,
                task: task.clone(),
                result,
            });
            self.dispatcher.record_executed();
            self.progress.record_completion();
            handled += 1;
        }

        engine_trace!("worker {} exiting after {} tasks", self.worker, handled);
    }
}
