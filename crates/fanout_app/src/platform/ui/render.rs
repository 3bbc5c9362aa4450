use fanout_core::{AppViewModel, ControlsView, SessionState};

const BAR_WIDTH: usize = 30;

/// Turns successive view models into console lines, printing only what changed.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    printed_lines: usize,
    last_session: Option<SessionState>,
    last_percent: Option<u8>,
}

impl ConsoleRenderer {
    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut out = Vec::new();

        let run_started =
            view.session.is_active() && !self.last_session.is_some_and(SessionState::is_active);
        if run_started {
            out.push(format!("== Run started: {} tasks ==", view.task_count));
            self.printed_lines = 0;
        } else if view.lines.len() < self.printed_lines {
            out.push("-- results cleared --".to_string());
            self.printed_lines = 0;
        }
        out.extend(view.lines[self.printed_lines..].iter().cloned());
        self.printed_lines = view.lines.len();

        if view.session.is_active() && self.last_percent != Some(view.percent) {
            out.push(format!(
                "{} {:>3}% ({} downloaded, {} failed of {})",
                progress_bar(view.percent),
                view.percent,
                view.downloaded,
                view.failed,
                view.task_count
            ));
            self.last_percent = Some(view.percent);
        }
        if !view.session.is_active() {
            self.last_percent = None;
        }

        if self.last_session != Some(view.session) {
            out.push(format!(
                "Session: {} | Tasks: {} | {}",
                session_label(view.session),
                view.task_count,
                controls_hint(&view.controls)
            ));
            self.last_session = Some(view.session);
        }

        out
    }
}

fn session_label(session: SessionState) -> &'static str {
    match session {
        SessionState::Idle => "Idle",
        SessionState::Running => "Running",
        SessionState::Stopping => "Stopping",
        SessionState::Breaking => "Breaking",
        SessionState::Cancelling => "Cancelling",
    }
}

fn controls_hint(controls: &ControlsView) -> String {
    let available: Vec<&str> = [
        (controls.can_start, "start"),
        (controls.can_stop, "stop"),
        (controls.can_break, "break"),
        (controls.can_cancel, "cancel"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect();
    if available.is_empty() {
        "waiting for the run to settle".to_string()
    } else {
        format!("available: {}", available.join(", "))
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
