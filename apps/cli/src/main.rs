use anyhow::Context;
use biogate_cli::{Cli, logging, runtime};
use biogate_kernel::config::load_app_config;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_app_config(cli.config.as_deref()).context("Critical: Configuration is malformed")?;

    let _log = logging::init(&config.logging, cli.verbose)?;

    let store = runtime::open_store(&config.storage).await?;

    let outcome = runtime::run(&config, store, cli.command, &mut std::io::stdout()).await?;

    Ok(outcome.into())
}
