//! TTD CLI - maintenance commands over the shared data file.
//!
//! # Usage
//!
//! ```bash
//! # Write a fresh seed snapshot (refuses to overwrite without --force)
//! ttd-cli seed --force
//!
//! # Print dashboard figures
//! ttd-cli stats
//!
//! # Grant or revoke the admin role
//! ttd-cli admin promote -e someone@example.in
//! ttd-cli admin demote -e someone@example.in
//!
//! # Export orders as JSON
//! ttd-cli orders export --out orders.json
//! ```
//!
//! The data file is `TTD_DATA_FILE` (default `data/store.json`), the same one
//! the storefront and admin use. Logs go to stderr so exports can be piped.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ttd-cli")]
#[command(author, version, about = "TTD shop maintenance tools")]
struct Cli {
    /// Snapshot file shared with the storefront and admin
    #[arg(long, env = "TTD_DATA_FILE", default_value = "data/store.json", global = true)]
    data_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fresh seed snapshot
    Seed {
        /// Replace an existing data file
        #[arg(long)]
        force: bool,
    },
    /// Print dashboard statistics
    Stats,
    /// Manage the admin role
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Order maintenance
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Give an account the admin role
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Return an admin to the customer role
    Demote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Export orders as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Only orders with this status (e.g. `pending`, `shipped`)
        #[arg(short, long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let path = cli.data_file;
    match cli.command {
        Commands::Seed { force } => commands::seed::run(&path, force).await?,
        Commands::Stats => commands::stats::run(&path).await?,
        Commands::Admin { action } => match action {
            AdminAction::Promote { email } => commands::admin::promote(&path, &email).await?,
            AdminAction::Demote { email } => commands::admin::demote(&path, &email).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Export { out, status } => {
                commands::orders::export(&path, out.as_deref(), status.as_deref()).await?;
            }
        },
    }
    Ok(())
}
