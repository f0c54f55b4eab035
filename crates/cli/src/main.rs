//! Operational command-line tools: migrations and admin account management.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "libro-reclamaciones", version, about = "Complaint book operations toolbox")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run pending database migrations
    Migrate,
    /// Create an admin panel account
    CreateAdmin(commands::admin::CreateAdminArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer())
        .init();

    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate => commands::migrate::run().await,
        Command::CreateAdmin(args) => commands::admin::run(args).await,
    }
}
