//! Fanout engine: bounded worker pool, termination control and run sessions.
mod decode;
mod error;
mod fetch;
mod pool;
mod progress;
mod session;
mod sink;
mod termination;
mod types;

pub use decode::{decode_text, DecodeError, DecodedText};
pub use error::{EngineError, SessionError};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use pool::{Parallelism, WorkerPool};
pub use progress::ProgressAggregator;
pub use session::{RunHandle, RunOptions, RunSession, SessionMode};
pub use sink::{ChannelSink, ProgressSink, ResultSink};
pub use termination::{TerminationController, TerminationState};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, ProgressSnapshot, RunId,
    RunOutcome, RunSummary, Task, TaskResult,
};
pub use tokio_util::sync::CancellationToken;
