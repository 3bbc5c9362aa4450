//! Termination state for a single run.
//!
//! A controller is created per run and shared by reference with every worker.
//! Stop and break are cooperative flags read at dispatch time; cancel also
//! fires a [`CancellationToken`] that fetchers can watch while they block.

use std::sync::atomic::{AtomicU8, Ordering};

use engine_logging::engine_debug;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationState {
    Running,
    StopRequested,
    BreakRequested,
    CancelRequested,
}

const RUNNING: u8 = 0;
const STOP: u8 = 1;
const BREAK: u8 = 2;
const CANCEL: u8 = 3;

impl TerminationState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            STOP => TerminationState::StopRequested,
            BREAK => TerminationState::BreakRequested,
            CANCEL => TerminationState::CancelRequested,
            _ => TerminationState::Running,
        }
    }
}

/// Never reused across runs: there is no way back to `Running`.
#[derive(Debug, Default)]
pub struct TerminationController {
    mode: AtomicU8,
    token: CancellationToken,
}

impl TerminationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a cooperative stop. Returns `false` if another mode was already set.
    pub fn request_stop(&self) -> bool {
        self.transition_from_running(STOP)
    }

    /// Requests a cooperative break. Returns `false` if another mode was already set.
    pub fn request_break(&self) -> bool {
        self.transition_from_running(BREAK)
    }

    /// Cancels the run. Overrides a pending stop or break; idempotent.
    pub fn request_cancel(&self) {
        let previous = self.mode.swap(CANCEL, Ordering::AcqRel);
        self.token.cancel();
        if previous != CANCEL {
            engine_debug!(
                "cancel requested (was {:?})",
                TerminationState::from_raw(previous)
            );
        }
    }

    pub fn current_mode(&self) -> TerminationState {
        if self.token.is_cancelled() {
            return TerminationState::CancelRequested;
        }
        TerminationState::from_raw(self.mode.load(Ordering::Acquire))
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token handed to fetchers so a blocked fetch can notice cancellation.
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    fn transition_from_running(&self, target: u8) -> bool {
        let changed = self
            .mode
            .compare_exchange(RUNNING, target, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if changed {
            engine_debug!("{:?} set", TerminationState::from_raw(target));
        }
        changed
    }
}
