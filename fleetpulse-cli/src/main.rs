//! FleetPulse CLI - command-line interface
//!
//! This binary provides a reference consumer for the FleetPulse library:
//! it seeds a demo fleet, runs the tracking engine, and streams events to
//! the terminal.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleetpulse", version, about = "Real-time fleet tracking and simulation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated fleet and stream tracking events until Ctrl-C.
    Run(commands::run::RunArgs),
    /// Plan a route through ordered stops via the routing service.
    Plan(commands::plan::PlanArgs),
}

#[tokio::main]
async fn main() {
    // RUST_LOG overrides; default keeps the engine's info-level lifecycle
    // messages visible without drowning the event stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Plan(args) => commands::plan::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
