//! Sightline CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write the default config
//! - `status`    — Show the active configuration
//! - `doctor`    — Diagnose config, annotations and provider
//! - `describe`  — Narrate one request read from a JSON file
//! - `stream`    — Narrate newline-delimited JSON requests from stdin

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "sightline",
    about = "Sightline — contextual scene narration for guide robots",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Show system status
    Status,

    /// Diagnose system health
    Doctor,

    /// Narrate a single request
    Describe {
        /// JSON request file (pose, images, language, ...)
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Narrate newline-delimited JSON requests from stdin, one JSON line out per request
    Stream,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries narrations
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Describe { request } => commands::describe::run(request).await?,
        Commands::Stream => commands::stream::run().await?,
    }

    Ok(())
}
