use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::EngineError;

pub type RunId = u64;

/// One unit of work: the input identifier handed to the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Task {
    url: String,
}

impl Task {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl From<&str> for Task {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Task {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub encoding_label: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub content: String,
    pub metadata: FetchMetadata,
}

impl FetchOutput {
    /// Wraps already-decoded text, for fetchers that do not talk HTTP.
    pub fn from_text(task: &Task, content: impl Into<String>) -> Self {
        let content = content.into();
        let metadata = FetchMetadata {
            original_url: task.url().to_string(),
            final_url: task.url().to_string(),
            content_type: None,
            encoding_label: None,
            byte_len: content.len() as u64,
        };
        Self { content, metadata }
    }

    /// Length of the content in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// What a worker produced for one executed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub index: usize,
    pub task: Task,
    pub result: Result<FetchOutput, FetchError>,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Character length of the fetched content, `None` for failures.
    pub fn char_len(&self) -> Option<usize> {
        self.result.as_ref().ok().map(FetchOutput::char_len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Progress published after each executed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// How a pool run ended. Produced exactly once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    CompletedAll,
    StoppedEarly,
    /// Carries the lowest task index abandoned because of the break.
    BrokenEarly(usize),
    Cancelled,
}

/// Terminal report for one run: always produced, even when the engine failed.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub total: usize,
    pub delivered: usize,
    pub elapsed: Duration,
    pub outcome: Result<RunOutcome, Arc<EngineError>>,
}

impl RunSummary {
    pub fn is_failed(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn status_message(&self) -> String {
        match &self.outcome {
            Ok(RunOutcome::CompletedAll) => "Run completed: every task finished.".to_string(),
            Ok(RunOutcome::StoppedEarly) => "Run exited early by stop.".to_string(),
            Ok(RunOutcome::BrokenEarly(index)) => {
                format!("Run exited early by break at task {index}.")
            }
            Ok(RunOutcome::Cancelled) => "The run was cancelled.".to_string(),
            Err(err) => format!("Run failed: {err}"),
        }
    }
}

/// Everything a run reports, in the order the session's channel received it.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    RunStarted { run_id: RunId, total: usize },
    Progress(ProgressSnapshot),
    TaskFinished(TaskResult),
    RunFinished(RunSummary),
}
