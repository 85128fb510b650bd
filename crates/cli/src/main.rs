//! Confidant CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive chat or single-message mode
//! - `profile` — Show what Confidant remembers about you
//! - `reset`   — Clear persisted session state

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "confidant",
    about = "Confidant — a conversational assistant that remembers who you are",
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
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show the stored user profile
    Profile,

    /// Clear persisted session state
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message, cli.verbose).await?,
        Commands::Profile => commands::profile::run().await?,
        Commands::Reset => commands::reset::run().await?,
    }

    Ok(())
}
