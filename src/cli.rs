use std::path::PathBuf;

use clap::Parser;

use crate::services::exports::DEFAULT_STRATEGY;

/// Fetch active proxies from PROXY6.net and write them to a file.
#[derive(Parser, Debug, Clone)]
#[command(name = "px6-proxy-fetcher", version, about)]
pub struct Args {
    /// PROXY6 API key (defaults to the PX6_API_KEY env var)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Destination file for the proxy list
    #[arg(short, long, default_value = "proxies.txt")]
    pub output: PathBuf,

    /// Print shell export commands for PROXY_LIST after writing the file
    #[arg(long)]
    pub print_env: bool,

    /// HTTP timeout for the API request in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Label exported as PROXY_STRATEGY
    #[arg(long, default_value = DEFAULT_STRATEGY)]
    pub strategy: String,

    /// Suppress info logs
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging for troubleshooting
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

impl Verbosity {
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            Verbosity::Quiet => log::LevelFilter::Warn,
            Verbosity::Normal => log::LevelFilter::Info,
            Verbosity::Verbose => log::LevelFilter::Debug,
        }
    }
}
