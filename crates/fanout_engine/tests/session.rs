mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fanout_engine::{
    EngineEvent, FetchError, FetchOutput, Parallelism, RunOptions, RunOutcome, RunSession,
    SessionError, SessionMode, Task, TerminationState,
};
use pretty_assertions::assert_eq;

use common::{init_logging, numbered_tasks, tasks, text_output, Gate};

fn options(workers: usize) -> RunOptions {
    RunOptions {
        parallelism: Parallelism::fixed(workers),
    }
}

fn drain(session: &RunSession) -> Vec<EngineEvent> {
    std::iter::from_fn(|| session.try_recv()).collect()
}

fn gated_session(gate: &Arc<Gate>) -> RunSession {
    let gate = Arc::clone(gate);
    RunSession::new(Arc::new(
        move |task: &Task| -> Result<FetchOutput, FetchError> {
            gate.pass();
            Ok(text_output(task, 10))
        },
    ))
}

#[test]
fn completed_run_publishes_events_and_returns_to_idle() {
    init_logging();
    let session = RunSession::new(Arc::new(
        |task: &Task| -> Result<FetchOutput, FetchError> {
            let len = match task.url() {
                "A" => 5,
                "B" => 10,
                "C" => 15,
                _ => 20,
            };
            Ok(text_output(task, len))
        },
    ));

    let summary = session
        .start(tasks(&["A", "B", "C", "D"]), options(2))
        .unwrap()
        .wait();

    assert_eq!(summary.outcome.as_ref().ok(), Some(&RunOutcome::CompletedAll));
    assert_eq!((summary.total, summary.delivered), (4, 4));
    assert_eq!(session.mode(), SessionMode::Idle);
    assert!(!session.is_running());

    let events = drain(&session);
    assert!(matches!(
        events.first(),
        Some(EngineEvent::RunStarted { total: 4, .. })
    ));
    assert!(matches!(events.last(), Some(EngineEvent::RunFinished(_))));

    let mut lengths: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::TaskFinished(result) => result.char_len(),
            _ => None,
        })
        .collect();
    lengths.sort_unstable();
    assert_eq!(lengths, vec![5, 10, 15, 20]);

    let percents: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Progress(snapshot) => Some(snapshot.percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![25, 50, 75, 100]);
}

#[test]
fn second_start_while_running_is_rejected() {
    init_logging();
    let gate = Arc::new(Gate::default());
    let session = gated_session(&gate);

    let handle = session.start(numbered_tasks(3), options(1)).unwrap();
    gate.wait_entered(1);

    assert!(matches!(
        session.start(numbered_tasks(1), options(1)),
        Err(SessionError::AlreadyRunning)
    ));
    assert_eq!(
        session.mode(),
        SessionMode::Running(TerminationState::Running)
    );
    assert!(session.request_stop());
    assert_eq!(
        session.mode(),
        SessionMode::Running(TerminationState::StopRequested)
    );
    gate.open();

    let summary = handle.wait();
    assert_eq!(summary.outcome.as_ref().ok(), Some(&RunOutcome::StoppedEarly));
    assert_eq!(summary.delivered, 1);
    assert_eq!(session.mode(), SessionMode::Idle);
}

#[test]
fn cancelled_run_does_not_leak_into_the_next_one() {
    init_logging();
    let gate = Arc::new(Gate::default());
    let session = gated_session(&gate);

    let first = session.start(numbered_tasks(5), options(1)).unwrap();
    gate.wait_entered(1);
    assert!(session.cancel());
    assert!(session.cancel());
    gate.open();
    let first = first.wait();

    assert_eq!(first.outcome.as_ref().ok(), Some(&RunOutcome::Cancelled));
    assert_eq!(first.delivered, 1);
    assert_eq!(session.mode(), SessionMode::Idle);

    let second = session.start(numbered_tasks(5), options(1)).unwrap();
    assert_eq!(second.run_id(), first.run_id + 1);
    let second = second.wait();

    assert_eq!(second.outcome.as_ref().ok(), Some(&RunOutcome::CompletedAll));
    assert_eq!(second.delivered, 5);
}

#[test]
fn break_through_the_session_reports_the_break_index() {
    init_logging();
    let gate = Arc::new(Gate::default());
    let session = gated_session(&gate);

    let handle = session.start(numbered_tasks(4), options(1)).unwrap();
    gate.wait_entered(1);
    assert!(session.request_break());
    assert!(!session.request_stop());
    gate.open();

    let summary = handle.wait();
    assert_eq!(
        summary.outcome.as_ref().ok(),
        Some(&RunOutcome::BrokenEarly(1))
    );
    assert_eq!(summary.status_message(), "Run exited early by break at task 1.");
}

#[test]
fn requests_while_idle_are_ignored() {
    init_logging();
    let session = RunSession::new(Arc::new(
        |task: &Task| -> Result<FetchOutput, FetchError> { Ok(text_output(task, 1)) },
    ));

    assert!(!session.cancel());
    assert!(!session.request_stop());
    assert!(!session.request_break());
    assert_eq!(session.mode(), SessionMode::Idle);

    let summary = session.start(numbered_tasks(3), options(2)).unwrap().wait();
    assert_eq!(summary.outcome.as_ref().ok(), Some(&RunOutcome::CompletedAll));
}

#[test]
fn engine_failure_is_reported_and_the_session_recovers() {
    init_logging();
    let session = RunSession::new(Arc::new(
        |task: &Task| -> Result<FetchOutput, FetchError> {
            if task.url() == "boom" {
                panic!("sink on fire");
            }
            Ok(text_output(task, 1))
        },
    ));

    let failed = session.start(tasks(&["boom"]), options(1)).unwrap().wait();
    assert!(failed.is_failed());
    assert!(failed.status_message().starts_with("Run failed"));
    assert_eq!(session.mode(), SessionMode::Idle);
    assert!(matches!(
        drain(&session).last(),
        Some(EngineEvent::RunFinished(summary)) if summary.is_failed()
    ));

    let recovered = session.start(tasks(&["ok"]), options(1)).unwrap().wait();
    assert_eq!(
        recovered.outcome.as_ref().ok(),
        Some(&RunOutcome::CompletedAll)
    );
}

#[test]
fn empty_run_completes_immediately() {
    init_logging();
    let session = RunSession::new(Arc::new(
        |_: &Task| -> Result<FetchOutput, FetchError> { panic!("nothing to fetch") },
    ));

    let summary = session.start(Vec::new(), RunOptions::default()).unwrap().wait();

    assert_eq!(summary.outcome.as_ref().ok(), Some(&RunOutcome::CompletedAll));
    assert_eq!(summary.delivered, 0);
    let events = drain(&session);
    assert_eq!(events.len(), 2);
}

#[test]
fn elapsed_time_covers_the_fetches() {
    init_logging();
    let session = RunSession::new(Arc::new(
        |task: &Task| -> Result<FetchOutput, FetchError> {
            thread::sleep(Duration::from_millis(20));
            Ok(text_output(task, 1))
        },
    ));

    let summary = session.start(numbered_tasks(2), options(1)).unwrap().wait();

    assert!(summary.elapsed >= Duration::from_millis(40));
}
