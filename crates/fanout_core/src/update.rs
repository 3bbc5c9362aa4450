use crate::{AppState, Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartClicked => {
            if state.session() == SessionState::Idle {
                let (tasks, max_workers) = state.begin_run();
                vec![Effect::StartRun { tasks, max_workers }]
            } else {
                Vec::new()
            }
        }
        Msg::StopClicked => {
            if state.session() == SessionState::Running {
                state.set_session(SessionState::Stopping);
                vec![Effect::RequestStop]
            } else {
                Vec::new()
            }
        }
        Msg::BreakClicked => {
            if state.session() == SessionState::Running {
                state.set_session(SessionState::Breaking);
                vec![Effect::RequestBreak]
            } else {
                Vec::new()
            }
        }
        Msg::CancelClicked => match state.session() {
            // Cancel escalates a pending stop or break.
            SessionState::Running | SessionState::Stopping | SessionState::Breaking => {
                state.set_session(SessionState::Cancelling);
                vec![Effect::Cancel]
            }
            SessionState::Idle | SessionState::Cancelling => Vec::new(),
        },
        Msg::ClearClicked => {
            if state.session() == SessionState::Idle {
                state.clear_log();
            }
            Vec::new()
        }
        Msg::RunStarted { .. } => {
            state.reset_progress();
            Vec::new()
        }
        Msg::Progress { percent } => {
            state.apply_progress(percent);
            Vec::new()
        }
        Msg::TaskReported(report) => {
            state.apply_report(report);
            Vec::new()
        }
        Msg::RunFinished {
            end,
            status,
            elapsed_ms,
        } => {
            state.finish_run(end, status, elapsed_ms);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
