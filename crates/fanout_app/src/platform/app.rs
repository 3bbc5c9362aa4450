use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::{engine_debug, engine_info};
use fanout_core::{update, AppState, Msg};
use fanout_engine::ReqwestFetcher;

use super::config;
use super::effects::EffectRunner;
use super::ui::commands::{self, ConsoleCommand};
use super::ui::render::ConsoleRenderer;

/// Pace of the render tick while no input arrives.
const TICK: Duration = Duration::from_millis(75);

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub config_path: PathBuf,
    pub workers: Option<usize>,
    pub auto_start: bool,
    pub exit_when_done: bool,
    pub init_config: bool,
}

pub fn run_app(options: AppOptions) -> Result<()> {
    if options.init_config {
        config::save_default_config(&options.config_path)?;
        println!("Wrote default config to {}", options.config_path.display());
        return Ok(());
    }

    let mut config = config::load_config(&options.config_path)?;
    if options.workers.is_some() {
        config.max_workers = options.workers;
    }
    let fetcher =
        ReqwestFetcher::new(config.fetch.to_settings()).context("building HTTP client")?;

    let (input_tx, input_rx) = mpsc::channel::<InputEvent>();
    thread::Builder::new()
        .name("fanout-stdin".to_string())
        .spawn(move || read_console(input_tx))
        .context("spawning console reader")?;

    let mut app = ConsoleApp {
        state: AppState::new(config.tasks, config.max_workers),
        runner: EffectRunner::new(Arc::new(fetcher)),
        renderer: ConsoleRenderer::default(),
        out: io::stdout(),
    };
    println!("{}", commands::HELP);
    app.render(true)?;
    if options.auto_start {
        app.dispatch(Msg::StartClicked)?;
    }

    let mut quitting = false;
    let mut input_open = true;
    loop {
        if input_open {
            match input_rx.recv_timeout(TICK) {
                Ok(InputEvent::Command(ConsoleCommand::Core(msg))) => app.dispatch(msg)?,
                Ok(InputEvent::Command(ConsoleCommand::Help)) => app.print(commands::HELP)?,
                Ok(InputEvent::Command(ConsoleCommand::Quit)) => {
                    quitting = true;
                    if app.runner.is_running() {
                        app.dispatch(Msg::CancelClicked)?;
                    }
                }
                Ok(InputEvent::Unknown(word)) => {
                    app.print(&format!("unknown command '{word}'; {}", commands::HELP))?
                }
                Err(mpsc::RecvTimeoutError::Timeout) => app.dispatch(Msg::Tick)?,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    engine_debug!("console input closed");
                    input_open = false;
                    quitting = !options.exit_when_done || !app.runner.is_running();
                }
            }
        } else if let Some(msg) = app.runner.wait_event(TICK) {
            app.dispatch(msg)?;
        }

        for msg in app.runner.poll() {
            app.dispatch(msg)?;
        }

        let idle = !app.state.session().is_active() && !app.runner.is_running();
        let finished_once = app.state.view().last_end.is_some();
        if idle && (quitting || (options.exit_when_done && finished_once)) {
            break;
        }
    }

    engine_info!("console session ended");
    Ok(())
}

enum InputEvent {
    Command(ConsoleCommand),
    Unknown(String),
}

fn read_console(input_tx: mpsc::Sender<InputEvent>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let event = match commands::parse_command(&line) {
            None => continue,
            Some(Ok(command)) => InputEvent::Command(command),
            Some(Err(word)) => InputEvent::Unknown(word),
        };
        if input_tx.send(event).is_err() {
            break;
        }
    }
}

struct ConsoleApp {
    state: AppState,
    runner: EffectRunner,
    renderer: ConsoleRenderer,
    out: io::Stdout,
}

impl ConsoleApp {
    fn dispatch(&mut self, msg: Msg) -> Result<()> {
        let mut pending = vec![msg];
        while let Some(msg) = pending.pop() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            pending.extend(self.runner.apply(effects));
        }
        self.render(false)
    }

    fn render(&mut self, force: bool) -> Result<()> {
        let dirty = self.state.consume_dirty();
        if !dirty && !force {
            return Ok(());
        }
        let lines = self.renderer.render(&self.state.view());
        let mut out = self.out.lock();
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        let mut out = self.out.lock();
        writeln!(out, "{text}")?;
        out.flush()?;
        Ok(())
    }
}
