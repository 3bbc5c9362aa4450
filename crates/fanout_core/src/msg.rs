#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for a new run over the configured task list.
    StartClicked,
    /// User asked the run to stop dispatching new tasks.
    StopClicked,
    /// User asked the run to break at the next task index.
    BreakClicked,
    /// User asked for hard cancellation.
    CancelClicked,
    /// User cleared the results log.
    ClearClicked,
    /// Engine accepted the run.
    RunStarted { total: usize },
    /// Engine progress in percent.
    Progress { percent: u8 },
    /// Engine delivered one task's result.
    TaskReported(crate::TaskReport),
    /// Engine settled the run.
    RunFinished {
        end: crate::RunEndKind,
        status: String,
        elapsed_ms: u64,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
