//! Run settings: built-in defaults, then `sitemap_poller.ron`, then CLI flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use poller_logging::poller_info;
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};
use sitemap_engine::{ApiSettings, PollSchedule, DEFAULT_POLL_PERIOD};
use thiserror::Error;

use super::cli::Cli;
use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "sitemap_poller.ron";
const DEFAULT_SERVER: &str = "http://localhost:8888";
const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(5);
const BACKOFF_FACTOR: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: Option<String>,
    pub interval_ms: Option<u64>,
    pub backoff: Option<bool>,
    pub max_interval_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub schedule: PollSchedule,
    pub download: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Settings {
    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}

/// Loads the config file. An explicit path must exist; the default one is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = explicit.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
            return Ok(FileConfig::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    let config = parse_file_config(&content).map_err(|message| ConfigError::Parse {
        path: path.clone(),
        message,
    })?;
    poller_info!("Loaded config from {:?}", path);
    Ok(config)
}

fn parse_file_config(content: &str) -> Result<FileConfig, String> {
    ron::Options::default()
        .with_default_extension(Extensions::IMPLICIT_SOME)
        .from_str(content)
        .map_err(|err| err.to_string())
}

pub fn resolve(cli: &Cli, file: FileConfig) -> Settings {
    let defaults = ApiSettings::default();
    let server = cli
        .server
        .clone()
        .or(file.server)
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let api = ApiSettings {
        base_url: server,
        connect_timeout: file
            .connect_timeout_ms
            .map_or(defaults.connect_timeout, Duration::from_millis),
        request_timeout: file
            .request_timeout_ms
            .map_or(defaults.request_timeout, Duration::from_millis),
        ..defaults
    };

    let period = cli
        .interval_ms
        .or(file.interval_ms)
        .map_or(DEFAULT_POLL_PERIOD, Duration::from_millis);
    let backoff = cli.backoff || file.backoff.unwrap_or(false);
    let schedule = if backoff {
        PollSchedule::Backoff {
            initial: period,
            max: cli
                .max_interval_ms
                .or(file.max_interval_ms)
                .map_or(DEFAULT_MAX_INTERVAL, Duration::from_millis),
            factor: BACKOFF_FACTOR,
        }
    } else {
        PollSchedule::Fixed { period }
    };

    Settings {
        api,
        schedule,
        download: cli.download.clone(),
        log_file: cli.log_file.clone(),
        verbose: cli.verbose,
    }
}
