//! graphiti-tutor CLI entry point.

use anyhow::Result;
use clap::Parser;
use graphiti_tutor::cli::{commands, Cli, Commands};
use graphiti_tutor::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment and config file still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("graphiti_tutor={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };
    let settings = Settings::load_from(Some(&config_path))?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path)?;
        }

        command => {
            settings.validate()?;
            run_graph_command(command, settings).await?;
        }
    }

    Ok(())
}

async fn run_graph_command(command: &Commands, settings: Settings) -> Result<()> {
    match command {
        Commands::Quickstart { skip_ingest } => {
            commands::run_quickstart(*skip_ingest, &settings).await
        }

        Commands::Salesbot {
            setup,
            no_setup,
            model,
        } => {
            let answer = match (*setup, *no_setup) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::run_salesbot(answer, model.clone(), settings).await
        }

        Commands::Search {
            query,
            center,
            limit,
        } => commands::run_search(query, center.clone(), *limit, &settings).await,

        Commands::Nodes {
            query,
            recipe,
            limit,
        } => commands::run_nodes(query, *recipe, *limit, &settings).await,

        Commands::Episodes { last } => commands::run_episodes(*last, &settings).await,

        Commands::Clear { yes } => commands::run_clear(*yes, &settings).await,

        Commands::Doctor | Commands::Config { .. } => Ok(()),
    }
}
