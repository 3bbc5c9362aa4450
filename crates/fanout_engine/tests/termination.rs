use std::sync::Barrier;
use std::thread;

use fanout_engine::{TerminationController, TerminationState};

#[test]
fn fresh_controller_is_running() {
    let controller = TerminationController::new();
    assert_eq!(controller.current_mode(), TerminationState::Running);
    assert!(!controller.is_cancelled());
    assert!(!controller.cancel_token().is_cancelled());
}

#[test]
fn first_cooperative_request_wins() {
    let controller = TerminationController::new();
    assert!(controller.request_stop());
    assert!(!controller.request_break());
    assert!(!controller.request_stop());
    assert_eq!(controller.current_mode(), TerminationState::StopRequested);

    let controller = TerminationController::new();
    assert!(controller.request_break());
    assert!(!controller.request_stop());
    assert_eq!(controller.current_mode(), TerminationState::BreakRequested);
}

#[test]
fn cancel_overrides_cooperative_modes_and_is_permanent() {
    let controller = TerminationController::new();
    let token = controller.cancel_token();
    controller.request_break();
    controller.request_cancel();
    controller.request_cancel();

    assert_eq!(controller.current_mode(), TerminationState::CancelRequested);
    assert!(controller.is_cancelled());
    assert!(token.is_cancelled());
    assert!(!controller.request_stop());
    assert_eq!(controller.current_mode(), TerminationState::CancelRequested);
}

#[test]
fn concurrent_requests_settle_on_a_single_mode() {
    let controller = TerminationController::new();
    let barrier = Barrier::new(8);

    let winners: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let controller = &controller;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        controller.request_stop()
                    } else {
                        controller.request_break()
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum()
    });

    assert_eq!(winners, 1);
    assert_ne!(controller.current_mode(), TerminationState::Running);
}
