//! Frontline CLI - replay action logs, check snapshots, inspect rules.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Frontline - a deterministic capture-the-flag wargame engine
#[derive(Parser, Debug)]
#[command(name = "frontline")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log filter, e.g. `frontline=debug` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a JSON action log to a fresh game
    Replay {
        /// Action log: a JSON array of actions
        #[arg(required = true)]
        actions: PathBuf,

        /// Board width (default: 12)
        #[arg(long, default_value = "12")]
        width: u16,

        /// Board height (default: 12)
        #[arg(long, default_value = "12")]
        height: u16,

        /// Rules file (JSON); missing fields take default values
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Output format: text, json, or board
        #[arg(short, long, default_value = "text")]
        format: cli::ReplayFormat,

        /// Render the board from player N's perspective (default: omniscient)
        #[arg(short, long)]
        player: Option<u8>,

        /// Fail on the first rejected action
        #[arg(long)]
        strict: bool,
    },

    /// Check a snapshot file for consistency
    Validate {
        /// Snapshot file (JSON)
        #[arg(required = true)]
        snapshot: PathBuf,
    },

    /// Print the rules in force as JSON
    Rules {
        /// Rules file to validate and print (default: built-in rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_tracing(args.log.as_deref());

    let result = match args.command {
        Commands::Replay {
            actions,
            width,
            height,
            rules,
            format,
            player,
            strict,
        } => cli::replay::execute(actions, width, height, rules, format, player, strict),

        Commands::Validate { snapshot } => cli::validate::execute(snapshot),

        Commands::Rules { rules } => cli::rules::execute(rules),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
