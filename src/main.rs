use std::process::ExitCode;

use clap::Parser;
use courier_lib::bootstrap::{config, tracing::init_tracing_subscriber};
use courier_lib::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path.clone())?,
        None => config::default_config()?,
    };

    init_tracing_subscriber(&config.logs_dir)?;

    cli::run(cli.command, &config).await
}
