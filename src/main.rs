#![warn(missing_debug_implementations, rust_2018_idioms)]
use std::{
    error::Error as _,
    io::{self, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod client;
mod error;
mod models;
mod repo;
mod services;
mod traits;

use cli::{Args, Verbosity};
use client::px6::Px6Client;
use error::FetcherError;
use repo::{config::ConfigRepo, proxy_file::ProxyFileRepo};
use services::{exports::format_env_exports, proxy::ProxyService};
use traits::ProxyClient;

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.verbosity().level_filter())
        .parse_default_env()
        .init();

    if let Err(err) = load_dotenv() {
        log::warn!("{err:#}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            if args.verbosity() == Verbosity::Verbose {
                let mut source = err.source();
                while let Some(cause) = source {
                    log::debug!("caused by: {cause}");
                    source = cause.source();
                }
            }
            ExitCode::from(err.exit_code())
        }
    }
}

/// Loads `.env` from the working directory. A missing file is fine.
fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            log::debug!("loaded environment from {}", path.display());
            Ok(())
        }
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("failed to load .env file"),
    }
}

fn run(args: &Args) -> Result<(), FetcherError> {
    let config_repo = ConfigRepo::new(args)?;
    log::debug!("resolved config: {config_repo:?}");

    let px6_client = Box::new(Px6Client::new(
        config_repo.api_key.clone(),
        config_repo.api_root.clone(),
        config_repo.timeout,
    )?);

    fetch_and_emit(&config_repo, px6_client, &mut io::stdout().lock())
}

/// Persists the proxy list, then prints the exports to `out` when asked.
fn fetch_and_emit(
    config_repo: &ConfigRepo,
    proxy_client: Box<dyn ProxyClient>,
    out: &mut impl Write,
) -> Result<(), FetcherError> {
    let proxy_service = ProxyService::new(proxy_client, ProxyFileRepo::new(&config_repo.output));

    let proxies = proxy_service.run()?;

    if config_repo.print_env {
        writeln!(out, "{}", format_env_exports(&proxies, &config_repo.strategy)).map_err(
            |err| FetcherError::Write {
                message: format!("failed to print exports: {err}"),
                source: err,
            },
        )?;
    }

    Ok(())
}
