use std::path::PathBuf;

use clap::Parser;

/// Ask a sitemap service to crawl a site and follow the job until the sitemap is ready.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the sitemap service.
    #[clap(short, long)]
    pub server: Option<String>,
    /// The website URL to build a sitemap for.
    #[clap(short = 'u', long)]
    pub home_url: String,
    /// Crawl depth. Sent to the service as-is.
    #[clap(short, long)]
    pub levels: String,
    /// Status poll period in milliseconds.
    #[clap(short, long)]
    pub interval_ms: Option<u64>,
    /// Wait for each status response and back off while nothing changes.
    #[clap(long)]
    pub backoff: bool,
    /// Longest delay between polls when backing off, in milliseconds.
    #[clap(long)]
    pub max_interval_ms: Option<u64>,
    /// Save the finished sitemap to this file.
    #[clap(short, long)]
    pub download: Option<PathBuf>,
    /// RON config file. Defaults to ./sitemap_poller.ron when present.
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    /// Also write logs to this file.
    #[clap(long)]
    pub log_file: Option<PathBuf>,
    /// Log poll details to the terminal.
    #[clap(short, long)]
    pub verbose: bool,
}
