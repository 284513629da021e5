//! twinmem CLI entry point.
//!
//! Binary name: `twinmem`
//!
//! Parses arguments, sets up tracing, wires the stores and providers, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use twinmem_infra::config::resolve_data_dir;
use twinmem_observe::tracing_setup::{init_tracing, shutdown_tracing, TracingOptions};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut tracing_options = TracingOptions::for_verbosity(cli.verbose);
    if cli.quiet {
        tracing_options.default_filter = "error".to_string();
    }
    tracing_options.enable_otel = cli.otel;
    init_tracing(&tracing_options)?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        // Shell completions don't need app state
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "twinmem", &mut std::io::stdout());
        }

        Commands::Add {
            subject,
            texts,
            metadata,
        } => {
            let metadata = cli::memory::parse_metadata(metadata.as_deref())?;
            let state = AppState::init_with_metadata(metadata).await?;
            cli::memory::add_facts(&state, &subject, &texts, cli.json).await?;
        }

        Commands::Recall { subject } => {
            let state = AppState::init().await?;
            cli::memory::recall(&state, &subject, cli.json).await?;
        }

        Commands::Graph { subject } => {
            let state = AppState::init().await?;
            cli::memory::graph(&state, &subject, cli.json).await?;
        }

        // Check opens each backend itself
        Commands::Check => {
            cli::check::check(&resolve_data_dir(), cli.json).await?;
        }

        Commands::Collections => {
            let state = AppState::init().await?;
            cli::check::collections(&state, cli.json).await?;
        }
    }

    Ok(())
}
