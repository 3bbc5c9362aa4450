//! Console shell around the engine: config, logging, input and rendering.
mod app;
mod config;
mod effects;
pub mod logging;
mod ui;

pub use app::{run_app, AppOptions};
