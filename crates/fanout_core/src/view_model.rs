use crate::{RunEndKind, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub task_count: usize,
    pub percent: u8,
    pub downloaded: usize,
    pub failed: usize,
    /// Results log, oldest first.
    pub lines: Vec<String>,
    pub last_end: Option<RunEndKind>,
    pub controls: ControlsView,
    pub dirty: bool,
}

/// Which commands the control surface should currently offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlsView {
    pub can_start: bool,
    pub can_stop: bool,
    pub can_break: bool,
    pub can_cancel: bool,
}
