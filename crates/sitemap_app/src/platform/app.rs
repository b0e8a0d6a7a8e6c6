use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use poller_logging::{poller_error, poller_info, poller_warn};
use sitemap_core::{update, AppState, Msg, Phase, SessionId};
use sitemap_engine::EngineHandle;

use super::cli::Cli;
use super::config::{self, Settings};
use super::effects::{EffectRunner, Inbound};
use super::logging;
use super::ui;

/// How long to wait for an engine event before sending a render tick.
const TICK_INTERVAL: Duration = Duration::from_millis(75);
const DOWNLOAD_GRACE: Duration = Duration::from_secs(5);

pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let file_config = config::load_file_config(cli.config.as_deref())?;
    let settings = config::resolve(&cli, file_config);
    logging::initialize(settings.log_destination(), settings.verbose);
    poller_info!(
        "sitemap-poller server={} schedule={:?}",
        settings.api.base_url,
        settings.schedule
    );

    let engine = EngineHandle::new(settings.api.clone()).context("starting engine")?;
    let runner = EffectRunner::new(engine, settings.schedule);
    let mut app = App::new(runner, settings.api.base_url.clone());

    app.dispatch(Msg::HomeUrlChanged(cli.home_url));
    app.dispatch(Msg::LevelsChanged(cli.levels));
    app.dispatch(Msg::SubmitClicked);
    app.run_until_terminal();

    let view = app.state.view();
    match view.phase {
        Phase::Done => match (settings.download.clone(), view.session_id, view.token) {
            (Some(target), Some(session_id), Some(token)) => {
                Ok(app.download(&settings, session_id, token, target))
            }
            _ => Ok(ExitCode::SUCCESS),
        },
        _ => Ok(ExitCode::FAILURE),
    }
}

struct App {
    state: AppState,
    runner: EffectRunner,
    server: String,
    last_frame: Vec<String>,
}

impl App {
    fn new(runner: EffectRunner, server: String) -> Self {
        Self {
            state: AppState::new(),
            runner,
            server,
            last_frame: Vec::new(),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.render(&state);
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn render(&mut self, state: &AppState) {
        let frame = ui::render::render(&state.view(), &self.server);
        if frame.is_empty() || frame == self.last_frame {
            return;
        }
        for line in &frame {
            println!("{line}");
        }
        self.last_frame = frame;
    }

    fn run_until_terminal(&mut self) {
        while !self.state.phase().is_terminal() {
            match self.runner.next_inbound(TICK_INTERVAL) {
                Some(Inbound::Msg(msg)) => self.dispatch(msg),
                // Downloads are only requested after the session ends.
                Some(Inbound::Downloaded(_)) => {}
                None => self.dispatch(Msg::Tick),
            }
        }
    }

    fn download(
        &mut self,
        settings: &Settings,
        session_id: SessionId,
        token: String,
        target: PathBuf,
    ) -> ExitCode {
        self.runner.download(session_id, token, target);
        let deadline = Instant::now() + settings.api.request_timeout + DOWNLOAD_GRACE;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match self.runner.next_inbound(remaining) {
                Some(Inbound::Downloaded(Ok(path))) => {
                    println!("Saved sitemap to {}", path.display());
                    return ExitCode::SUCCESS;
                }
                Some(Inbound::Downloaded(Err(err))) => {
                    poller_error!("{}", err);
                    eprintln!("{err}");
                    return ExitCode::FAILURE;
                }
                // Late poll responses; the core drops them.
                Some(Inbound::Msg(msg)) => self.dispatch(msg),
                None => {}
            }
        }
        poller_warn!("Gave up waiting for sitemap download");
        eprintln!("Timed out waiting for the sitemap download");
        ExitCode::FAILURE
    }
}
