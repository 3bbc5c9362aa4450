use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use engine_logging::{engine_debug, engine_info, engine_warn};
use fanout_core::{Effect, Msg, RunEndKind, TaskReport, TaskReportKind};
use fanout_engine::{
    EngineEvent, Fetcher, Parallelism, RunOptions, RunOutcome, RunSession, RunSummary, Task,
    TaskResult,
};

/// Carries out core effects against the engine session and turns engine
/// events back into core messages.
pub struct EffectRunner {
    session: RunSession,
}

impl EffectRunner {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            session: RunSession::new(fetcher),
        }
    }

    /// Applies `effects`. Returns messages for effects the engine rejected,
    /// so the core state never waits on a run that was not started.
    pub fn apply(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut feedback = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartRun { tasks, max_workers } => {
                    engine_info!(
                        "StartRun at {} tasks={} max_workers={:?}",
                        Local::now().to_rfc3339(),
                        tasks.len(),
                        max_workers
                    );
                    let tasks = tasks.into_iter().map(Task::new).collect();
                    let options = RunOptions {
                        parallelism: max_workers.map_or(Parallelism::Available, Parallelism::fixed),
                    };
                    if let Err(err) = self.session.start(tasks, options) {
                        engine_warn!("StartRun rejected: {}", err);
                        feedback.push(Msg::RunFinished {
                            end: RunEndKind::Failed {
                                reason: err.to_string(),
                            },
                            status: format!("Run failed: {err}"),
                            elapsed_ms: 0,
                        });
                    }
                }
                Effect::RequestStop => {
                    if !self.session.request_stop() {
                        engine_debug!("stop ignored in mode {:?}", self.session.mode());
                    }
                }
                Effect::RequestBreak => {
                    if !self.session.request_break() {
                        engine_debug!("break ignored in mode {:?}", self.session.mode());
                    }
                }
                Effect::Cancel => {
                    if !self.session.cancel() {
                        engine_debug!("cancel ignored: no active run");
                    }
                }
            }
        }
        feedback
    }

    /// Drains every engine event that has arrived so far.
    pub fn poll(&self) -> Vec<Msg> {
        std::iter::from_fn(|| self.session.try_recv())
            .map(map_event)
            .collect()
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn wait_event(&self, timeout: Duration) -> Option<Msg> {
        self.session.recv_timeout(timeout).map(map_event)
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::RunStarted { total, .. } => Msg::RunStarted { total },
        EngineEvent::Progress(snapshot) => Msg::Progress {
            percent: snapshot.percent,
        },
        EngineEvent::TaskFinished(result) => Msg::TaskReported(map_result(result)),
        EngineEvent::RunFinished(summary) => map_summary(&summary),
    }
}

fn map_result(result: TaskResult) -> TaskReport {
    let kind = match &result.result {
        Ok(output) => TaskReportKind::Downloaded {
            chars: output.char_len(),
        },
        Err(err) => {
            engine_warn!("Task #{} {} failed: {}", result.index, result.task, err);
            TaskReportKind::Failed {
                reason: err.to_string(),
            }
        }
    };
    TaskReport {
        url: result.task.url().to_string(),
        kind,
    }
}

fn map_summary(summary: &RunSummary) -> Msg {
    let end = match &summary.outcome {
        Ok(RunOutcome::CompletedAll) => RunEndKind::Completed,
        Ok(RunOutcome::StoppedEarly) => RunEndKind::Stopped,
        Ok(RunOutcome::BrokenEarly(index)) => RunEndKind::Broken { index: *index },
        Ok(RunOutcome::Cancelled) => RunEndKind::Cancelled,
        Err(err) => RunEndKind::Failed {
            reason: err.to_string(),
        },
    };
    Msg::RunFinished {
        end,
        status: summary.status_message(),
        elapsed_ms: u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}
