//! zoom-recordings CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use zoomrec_client::cli::{Cli, Command};
use zoomrec_client::commands;
use zoomrec_client::config::{ClientConfig, Settings};
use zoomrec_client::error::{ClientError, ClientResult};
use zoomrec_core::{init_tracing, TracingConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    // Ctrl-C cancels whatever is in flight
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    match run(cli, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(ClientError::Config)?;

    let settings = Settings::resolve(&cli, &config)?;

    match cli.command {
        Command::Login => commands::login::run(&settings, cancel).await,
        Command::Logout => commands::logout::run(&settings),
        Command::List(ref dates) => commands::list::run(&settings, dates, cancel).await,
        Command::Download {
            ref dates,
            ref output_dir,
        } => commands::download::run(&settings, dates, output_dir.clone(), cancel).await,
    }
}
