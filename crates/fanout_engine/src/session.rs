//! One run at a time, each with its own termination controller.
//!
//! `start` returns immediately; the run executes on a background thread and
//! every callback is marshaled onto the session's event channel. When the run
//! ends, however it ends, the active slot is cleared before `RunFinished` is
//! published, so a caller reacting to that event can start the next run.

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::error::panic_message;
use crate::sink::ChannelSink;
use crate::{
    EngineError, EngineEvent, Fetcher, Parallelism, ProgressAggregator, ResultSink, RunId,
    RunOutcome, RunSummary, SessionError, Task, TaskResult, TerminationController,
    TerminationState, WorkerPool,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub parallelism: Parallelism,
}

/// What the session is doing right now. `Idle` is the resting value between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Idle,
    Running(TerminationState),
}

struct ActiveRun {
    run_id: RunId,
    controller: Arc<TerminationController>,
}

type ActiveSlot = Arc<Mutex<Option<ActiveRun>>>;

pub struct RunSession {
    fetcher: Arc<dyn Fetcher>,
    active: ActiveSlot,
    last_run_id: AtomicU64,
    event_tx: mpsc::Sender<EngineEvent>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl RunSession {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            fetcher,
            active: Arc::new(Mutex::new(None)),
            last_run_id: AtomicU64::new(0),
            event_tx,
            event_rx,
        }
    }

    /// Starts a run over `tasks` without blocking the caller.
    pub fn start(&self, tasks: Vec<Task>, options: RunOptions) -> Result<RunHandle, SessionError> {
        let mut active = lock(&self.active);
        if active.is_some() {
            return Err(SessionError::AlreadyRunning);
        }

        let run_id = self.last_run_id.fetch_add(1, Ordering::Relaxed) + 1;
        let controller = Arc::new(TerminationController::new());
        *active = Some(ActiveRun {
            run_id,
            controller: Arc::clone(&controller),
        });

        let total = tasks.len();
        let started = Instant::now();
        let job = RunJob {
            run_id,
            tasks,
            options,
            controller,
            fetcher: Arc::clone(&self.fetcher),
            sink: ChannelSink::new(self.event_tx.clone()),
            slot: Arc::clone(&self.active),
        };

        let spawned = thread::Builder::new()
            .name(format!("fanout-run-{run_id}"))
            .spawn(move || job.execute());
        match spawned {
            Ok(handle) => {
                engine_debug!("run {} started with {} tasks", run_id, total);
                Ok(RunHandle {
                    run_id,
                    total,
                    started,
                    handle,
                })
            }
            Err(err) => {
                *active = None;
                Err(SessionError::Spawn(err))
            }
        }
    }

    /// Cancels the active run. Returns `false` when idle.
    pub fn cancel(&self) -> bool {
        self.with_active(|controller| controller.request_cancel())
            .is_some()
    }

    /// Requests a cooperative stop for the active run. Returns `false` when idle
    /// or when another termination mode was already set.
    pub fn request_stop(&self) -> bool {
        self.with_active(TerminationController::request_stop)
            .unwrap_or(false)
    }

    /// Requests a cooperative break for the active run. Returns `false` when idle
    /// or when another termination mode was already set.
    pub fn request_break(&self) -> bool {
        self.with_active(TerminationController::request_break)
            .unwrap_or(false)
    }

    pub fn mode(&self) -> SessionMode {
        self.with_active(TerminationController::current_mode)
            .map_or(SessionMode::Idle, SessionMode::Running)
    }

    pub fn is_running(&self) -> bool {
        lock(&self.active).is_some()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn with_active<R>(&self, f: impl FnOnce(&TerminationController) -> R) -> Option<R> {
        let controller = lock(&self.active)
            .as_ref()
            .map(|run| Arc::clone(&run.controller));
        if controller.is_none() {
            engine_debug!("termination request ignored: no active run");
        }
        controller.map(|controller| f(&controller))
    }
}

/// Handle to a started run.
pub struct RunHandle {
    run_id: RunId,
    total: usize,
    started: Instant,
    handle: JoinHandle<RunSummary>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the run has settled and the session is idle again.
    pub fn wait(self) -> RunSummary {
        match self.handle.join() {
            Ok(summary) => summary,
            Err(payload) => RunSummary {
                run_id: self.run_id,
                total: self.total,
                delivered: 0,
                elapsed: self.started.elapsed(),
                outcome: Err(Arc::new(EngineError::Panicked {
                    message: panic_message(payload.as_ref()),
                })),
            },
        }
    }
}

struct RunJob {
    run_id: RunId,
    tasks: Vec<Task>,
    options: RunOptions,
    controller: Arc<TerminationController>,
    fetcher: Arc<dyn Fetcher>,
    sink: ChannelSink,
    slot: ActiveSlot,
}

impl RunJob {
    fn execute(self) -> RunSummary {
        engine_logging::set_run_id(self.run_id);
        let reset = ResetOnExit {
            slot: &self.slot,
            run_id: self.run_id,
        };

        let total = self.tasks.len();
        let started = Instant::now();
        self.sink.emit(EngineEvent::RunStarted {
            run_id: self.run_id,
            total,
        });

        let results = CountingSink {
            inner: &self.sink,
            delivered: AtomicUsize::new(0),
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_pool(&results)))
            .unwrap_or_else(|payload| {
                Err(EngineError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });
        let elapsed = started.elapsed();

        drop(reset);

        let summary = RunSummary {
            run_id: self.run_id,
            total,
            delivered: results.delivered.load(Ordering::Acquire),
            elapsed,
            outcome: outcome.map_err(Arc::new),
        };
        match &summary.outcome {
            Ok(_) => engine_info!(
                "{} {} of {} delivered in {} ms",
                summary.status_message(),
                summary.delivered,
                total,
                elapsed.as_millis()
            ),
            Err(err) => engine_warn!("run failed after {} ms: {}", elapsed.as_millis(), err),
        }
        self.sink.emit(EngineEvent::RunFinished(summary.clone()));
        summary
    }

    fn run_pool(&self, results: &CountingSink<'_>) -> Result<RunOutcome, EngineError> {
        let Some(total) = NonZeroUsize::new(self.tasks.len()) else {
            return Ok(RunOutcome::CompletedAll);
        };
        let progress = ProgressAggregator::new(total, &self.sink);
        WorkerPool::new(self.options.parallelism).run(
            &self.tasks,
            &self.controller,
            self.fetcher.as_ref(),
            &progress,
            results,
        )
    }
}

struct CountingSink<'a> {
    inner: &'a ChannelSink,
    delivered: AtomicUsize,
}

impl ResultSink for CountingSink<'_> {
    fn deliver(&self, result: TaskResult) {
        self.delivered.fetch_add(1, Ordering::AcqRel);
        self.inner.deliver(result);
    }
}

/// Returns the session to idle when the run thread leaves, even by unwinding.
struct ResetOnExit<'a> {
    slot: &'a Mutex<Option<ActiveRun>>,
    run_id: RunId,
}

impl Drop for ResetOnExit<'_> {
    fn drop(&mut self) {
        let mut active = lock(self.slot);
        if active.as_ref().is_some_and(|run| run.run_id == self.run_id) {
            *active = None;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
