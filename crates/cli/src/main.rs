//! AgentBI CLI - Database migrations and local webhook tooling.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! agentbi-cli migrate
//!
//! # Print signed svix-* headers for a payload
//! agentbi-cli sign-webhook --id msg_local_1 --file user_created.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sign-webhook` - Sign a webhook payload with `WEBHOOK_SECRET`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "agentbi-cli")]
#[command(author, version, about = "AgentBI CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Sign a webhook payload for local testing
    SignWebhook {
        /// Message ID to sign as (`svix-id`)
        #[arg(long)]
        id: String,

        /// File holding the exact payload bytes
        #[arg(short, long)]
        file: PathBuf,

        /// Unix timestamp to sign at (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::SignWebhook {
            id,
            file,
            timestamp,
        } => commands::sign_webhook::run(&id, &file, timestamp)?,
    }
    Ok(())
}
