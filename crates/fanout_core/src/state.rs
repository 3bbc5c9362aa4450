use crate::view_model::{AppViewModel, ControlsView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopping,
    Breaking,
    Cancelling,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        self != SessionState::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEndKind {
    Completed,
    Stopped,
    Broken { index: usize },
    Cancelled,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub url: String,
    pub kind: TaskReportKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskReportKind {
    Downloaded { chars: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    tasks: Vec<String>,
    max_workers: Option<usize>,
    percent: u8,
    downloaded: usize,
    failed: usize,
    lines: Vec<String>,
    last_end: Option<RunEndKind>,
    dirty: bool,
}

impl AppState {
    pub fn new(tasks: Vec<String>, max_workers: Option<usize>) -> Self {
        Self {
            tasks,
            max_workers,
            ..Self::default()
        }
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn view(&self) -> AppViewModel {
        let idle = self.session == SessionState::Idle;
        AppViewModel {
            session: self.session,
            task_count: self.tasks.len(),
            percent: self.percent,
            downloaded: self.downloaded,
            failed: self.failed,
            lines: self.lines.clone(),
            last_end: self.last_end.clone(),
            controls: ControlsView {
                can_start: idle,
                can_stop: self.session == SessionState::Running,
                can_break: self.session == SessionState::Running,
                can_cancel: matches!(
                    self.session,
                    SessionState::Running | SessionState::Stopping | SessionState::Breaking
                ),
            },
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_run(&mut self) -> (Vec<String>, Option<usize>) {
        self.session = SessionState::Running;
        self.percent = 0;
        self.downloaded = 0;
        self.failed = 0;
        self.lines.clear();
        self.last_end = None;
        self.mark_dirty();
        (self.tasks.clone(), self.max_workers)
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        if self.session != session {
            self.session = session;
            self.mark_dirty();
        }
    }

    pub(crate) fn reset_progress(&mut self) {
        self.percent = 0;
        self.mark_dirty();
    }

    /// Progress only moves forward within a run.
    pub(crate) fn apply_progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.percent {
            self.percent = percent;
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_report(&mut self, report: TaskReport) {
        let line = match report.kind {
            TaskReportKind::Downloaded { chars } => {
                self.downloaded += 1;
                format!("{} downloaded: {} characters long.", report.url, chars)
            }
            TaskReportKind::Failed { reason } => {
                self.failed += 1;
                format!("{} failed: {}", report.url, reason)
            }
        };
        self.lines.push(line);
        self.mark_dirty();
    }

    pub(crate) fn finish_run(&mut self, end: RunEndKind, status: String, elapsed_ms: u64) {
        self.lines.push(status);
        self.lines.push(format!("Total execution time: {elapsed_ms} ms"));
        self.last_end = Some(end);
        self.session = SessionState::Idle;
        self.mark_dirty();
    }

    pub(crate) fn clear_log(&mut self) {
        if !self.lines.is_empty() {
            self.lines.clear();
            self.mark_dirty();
        }
    }
}
