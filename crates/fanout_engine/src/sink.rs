use std::sync::mpsc;

use crate::{EngineEvent, ProgressSnapshot, TaskResult};

/// Receives progress from worker threads. Must not block for long.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, snapshot: ProgressSnapshot);
}

/// Receives each executed task's result from worker threads, in completion order.
pub trait ResultSink: Send + Sync {
    fn deliver(&self, result: TaskResult);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressSnapshot) + Send + Sync,
{
    fn progress(&self, snapshot: ProgressSnapshot) {
        self(snapshot)
    }
}

impl<F> ResultSink for F
where
    F: Fn(TaskResult) + Send + Sync,
{
    fn deliver(&self, result: TaskResult) {
        self(result)
    }
}

/// Marshals every callback onto a single channel, so the consumer sees all
/// events from one thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

impl ProgressSink for ChannelSink {
    fn progress(&self, snapshot: ProgressSnapshot) {
        self.emit(EngineEvent::Progress(snapshot));
    }
}

impl ResultSink for ChannelSink {
    fn deliver(&self, result: TaskResult) {
        self.emit(EngineEvent::TaskFinished(result));
    }
}
