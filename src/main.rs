use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wallabag_sync::cli::commands::{self, EXIT_FATAL};
use wallabag_sync::cli::{Cli, Commands};
use wallabag_sync::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wallabag_sync=info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.sync.workers = workers;
    }

    let code = match cli.selected_command() {
        Commands::Sync => commands::sync_feed(config, false).await?,
        Commands::Plan => commands::sync_feed(config, true).await?,
        Commands::Config => commands::show_config(&config, cli.config.as_deref())?,
    };

    Ok(code)
}
