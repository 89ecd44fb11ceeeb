// ABOUTME: Entry point for the stevedore CLI application.
// ABOUTME: Parses arguments, sets up tracing, and dispatches to commands.

use clap::Parser;
use stevedore::cli::Cli;
use stevedore::commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    if let Err(e) = commands::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
