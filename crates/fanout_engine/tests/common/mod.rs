#![allow(dead_code)]

use std::sync::{Condvar, Mutex, Once};
use std::time::Duration;

use fanout_engine::{FetchOutput, ProgressSnapshot, Task, TaskResult};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn tasks(urls: &[&str]) -> Vec<Task> {
    urls.iter().copied().map(Task::from).collect()
}

pub fn numbered_tasks(count: usize) -> Vec<Task> {
    (0..count)
        .map(|i| Task::new(format!("https://example.test/{i}")))
        .collect()
}

/// Index encoded in a task built by [`numbered_tasks`].
pub fn task_index(task: &Task) -> usize {
    task.url()
        .rsplit('/')
        .next()
        .and_then(|tail| tail.parse().ok())
        .expect("numbered task")
}

pub fn text_output(task: &Task, len: usize) -> FetchOutput {
    FetchOutput::from_text(task, "x".repeat(len))
}

#[derive(Default)]
pub struct Recorder {
    results: Mutex<Vec<TaskResult>>,
    progress: Mutex<Vec<ProgressSnapshot>>,
}

impl Recorder {
    pub fn push_result(&self, result: TaskResult) {
        self.results.lock().unwrap().push(result);
    }

    pub fn push_progress(&self, snapshot: ProgressSnapshot) {
        self.progress.lock().unwrap().push(snapshot);
    }

    pub fn results(&self) -> Vec<TaskResult> {
        let mut results = self.results.lock().unwrap().clone();
        results.sort_by_key(|r| r.index);
        results
    }

    pub fn delivered_indices(&self) -> Vec<usize> {
        self.results().iter().map(|r| r.index).collect()
    }

    pub fn progress(&self) -> Vec<ProgressSnapshot> {
        self.progress.lock().unwrap().clone()
    }
}

/// Holds fetches inside the fetcher until the test opens it.
#[derive(Default)]
pub struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Default)]
struct GateState {
    entered: usize,
    open: bool,
}

impl Gate {
    /// Called from inside a fetch: records entry and blocks until opened.
    pub fn pass(&self) {
        let mut state = self.state.lock().unwrap();
        state.entered += 1;
        self.changed.notify_all();
        while !state.open {
            state = self.changed.wait(state).unwrap();
        }
    }

    pub fn wait_entered(&self, count: usize) {
        let state = self.state.lock().unwrap();
        let (state, timeout) = self
            .changed
            .wait_timeout_while(state, Duration::from_secs(10), |s| s.entered < count)
            .unwrap();
        assert!(
            !timeout.timed_out(),
            "only {} of {} fetches entered the gate",
            state.entered,
            count
        );
    }

    pub fn open(&self) {
        self.state.lock().unwrap().open = true;
        self.changed.notify_all();
    }
}
