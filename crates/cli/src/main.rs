//! Veritas CLI - drive the session client from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (stores the session cache for later commands)
//! veritas login -u alice
//!
//! # Create an account
//! veritas register -u alice -e alice@example.com
//!
//! # One-shot: reconcile with the server and print the result
//! veritas status
//!
//! # Keep the session alive, printing every state transition, until Ctrl-C
//! veritas watch
//!
//! # Account data
//! veritas profile
//! veritas stats
//!
//! # Log out everywhere
//! veritas logout
//! ```
//!
//! Configuration comes from the environment (see `veritas_client::config`);
//! at minimum `VERITAS_BASE_URL` must be set.

#![cfg_attr(not(test), forbid(unsafe_code))]
// A CLI's job is to print.
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "veritas")]
#[command(author, version, about = "Veritas session client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password (prompted for if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Register a new account
    Register {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (prompted for if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Reconcile with the server once and print the resulting state
    Status,
    /// Run the validation scheduler until Ctrl-C, printing transitions
    Watch,
    /// Print the account profile
    Profile,
    /// Print aggregate usage counters
    Stats,
    /// Log out (server notified best-effort, local state always cleared)
    Logout,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login { username, password } => commands::auth::login(&username, password).await?,
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(&username, &email, password).await?,
        Commands::Status => commands::auth::status().await?,
        Commands::Watch => commands::watch::run().await?,
        Commands::Profile => commands::account::profile().await?,
        Commands::Stats => commands::account::stats().await?,
        Commands::Logout => commands::auth::logout().await?,
    }

    Ok(())
}
