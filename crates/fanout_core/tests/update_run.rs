use std::sync::Once;

use fanout_core::{update, AppState, Msg, RunEndKind, SessionState, TaskReport, TaskReportKind};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn started() -> AppState {
    let state = AppState::new(
        vec!["https://a.example.com".to_string(), "https://b.example.com".to_string()],
        None,
    );
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, Msg::RunStarted { total: 2 });
    state
}

fn downloaded(url: &str, chars: usize) -> Msg {
    Msg::TaskReported(TaskReport {
        url: url.to_string(),
        kind: TaskReportKind::Downloaded { chars },
    })
}

#[test]
fn reports_and_completion_build_the_results_log() {
    init_logging();
    let (state, _) = update(started(), downloaded("https://b.example.com", 10));
    let (state, _) = update(state, Msg::Progress { percent: 50 });
    let (state, _) = update(
        state,
        Msg::TaskReported(TaskReport {
            url: "https://a.example.com".to_string(),
            kind: TaskReportKind::Failed {
                reason: "http status 404: 404 Not Found".to_string(),
            },
        }),
    );
    let (state, _) = update(state, Msg::Progress { percent: 100 });
    let (mut state, effects) = update(
        state,
        Msg::RunFinished {
            end: RunEndKind::Completed,
            status: "Run completed: every task finished.".to_string(),
            elapsed_ms: 42,
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.session, SessionState::Idle);
    assert_eq!(view.percent, 100);
    assert_eq!((view.downloaded, view.failed), (1, 1));
    assert_eq!(view.last_end, Some(RunEndKind::Completed));
    assert_eq!(
        view.lines,
        vec![
            "https://b.example.com downloaded: 10 characters long.".to_string(),
            "https://a.example.com failed: http status 404: 404 Not Found".to_string(),
            "Run completed: every task finished.".to_string(),
            "Total execution time: 42 ms".to_string(),
        ]
    );
    assert!(state.consume_dirty());
}

#[test]
fn progress_never_moves_backwards() {
    init_logging();
    let (state, _) = update(started(), Msg::Progress { percent: 60 });
    let (mut state, _) = update(state, Msg::Progress { percent: 30 });
    assert_eq!(state.view().percent, 60);
    assert!(state.consume_dirty());

    let (mut state, _) = update(state, Msg::Progress { percent: 30 });
    assert!(!state.consume_dirty());
}

#[test]
fn new_run_clears_previous_results() {
    init_logging();
    let (state, _) = update(started(), downloaded("https://a.example.com", 3));
    let (state, _) = update(
        state,
        Msg::RunFinished {
            end: RunEndKind::Cancelled,
            status: "The run was cancelled.".to_string(),
            elapsed_ms: 5,
        },
    );
    assert_eq!(state.view().lines.len(), 3);

    let (state, _) = update(state, Msg::StartClicked);
    let view = state.view();
    assert_eq!(view.session, SessionState::Running);
    assert!(view.lines.is_empty());
    assert_eq!(view.percent, 0);
    assert_eq!(view.last_end, None);
}

#[test]
fn clear_only_applies_when_idle() {
    init_logging();
    let (state, _) = update(started(), downloaded("https://a.example.com", 3));
    let (state, _) = update(state, Msg::ClearClicked);
    assert_eq!(state.view().lines.len(), 1);

    let (state, _) = update(
        state,
        Msg::RunFinished {
            end: RunEndKind::Broken { index: 1 },
            status: "Run exited early by break at task 1.".to_string(),
            elapsed_ms: 9,
        },
    );
    let (state, _) = update(state, Msg::ClearClicked);
    assert!(state.view().lines.is_empty());
    assert_eq!(state.view().last_end, Some(RunEndKind::Broken { index: 1 }));
}
