mod platform;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use platform::logging::LogDestination;
use platform::AppOptions;

/// Fetch a fixed list of URLs across a bounded worker pool.
#[derive(Debug, Parser)]
#[command(name = "fanout")]
#[command(about = "Bounded-parallelism fetch runner with stop, break and cancel", long_about = None)]
struct Cli {
    /// RON configuration file; built-in defaults are used when it does not exist.
    #[arg(long, default_value = "fanout.ron", value_name = "PATH")]
    config: PathBuf,

    /// Maximum number of concurrent fetches (default: available processing units).
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    log: LogTarget,

    /// Log at debug level.
    #[arg(long)]
    verbose: bool,

    /// Start a run immediately instead of waiting for `start`.
    #[arg(long)]
    auto_start: bool,

    /// Exit once the first run has finished.
    #[arg(long)]
    exit_when_done: bool,

    /// Write the default configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    platform::logging::initialize(cli.log.into(), level);

    platform::run_app(AppOptions {
        config_path: cli.config,
        workers: cli.workers,
        auto_start: cli.auto_start,
        exit_when_done: cli.exit_when_done,
        init_config: cli.init_config,
    })
}
