//! ABOUTME: `flowcraft` binary entrypoint — parses arguments and dispatches
//! ABOUTME: to the command implementations, matching llmspell-cli's shape

use clap::Parser;
use flowcraft_cli::cli::{Cli, CatalogAction, Command};
use flowcraft_cli::commands;
use flowcraft_config::FlowcraftConfig;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = match FlowcraftConfig::load(args.config.as_deref()).await {
        Ok(config) => config,
        Err(err) => {
            eprintln!("flowcraft: configuration error: {err}");
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Serve => commands::serve(&config).await,
        Command::Catalog { action: CatalogAction::Validate } => commands::catalog_validate(&config).await,
        Command::Workflow { action } => commands::workflow(&config, action).await,
    };

    if let Err(err) = result {
        eprintln!("flowcraft: {err}");
        std::process::exit(1);
    }
}
