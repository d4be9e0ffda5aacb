use crate::dashboard::{DEFAULT_REFRESH_SECS, DEFAULT_RUN_LIMIT};
use clap::Parser;
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "ghd", version = VERSION, about = "GitHub Actions dashboard for many repositories")]
pub struct Cli {
    /// Refresh interval in seconds
    #[arg(short, long, default_value_t = DEFAULT_REFRESH_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Runs fetched per repository
    #[arg(short, long, default_value_t = DEFAULT_RUN_LIMIT)]
    pub limit: usize,

    /// Load this saved profile at startup
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Directory holding config.json and profiles/ (default: $XDG_CONFIG_HOME/ghd)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Write debug logs to $XDG_STATE_HOME/ghd/debug.log
    #[arg(short, long)]
    pub verbose: bool,
}
