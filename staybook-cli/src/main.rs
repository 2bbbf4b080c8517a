//! Staybook CLI - booking exports into one ledger

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{collections, logs, upload};

/// Staybook - merge Airbnb and Booking exports into one bookings ledger
#[derive(Parser)]
#[command(name = "staybook", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an Airbnb or Booking CSV export
    Upload {
        /// Path to CSV file
        file: PathBuf,
        /// Listing name for exports without a listing column (Booking)
        #[arg(long)]
        listing: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List target collections other than the bookings ledger
    Collections {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command succeeded
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Upload { file, listing, json } => upload::run(&file, listing, json),
        Commands::Collections { json } => collections::run(json).map(|()| true),
        Commands::Logs { command } => logs::run(command).map(|()| true),
    }
}
