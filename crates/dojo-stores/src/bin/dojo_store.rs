//! `dojo-store`: apply patches to, read from, and replay history into a
//! JSON state document.
//!
//! Usage:
//!   dojo-store apply '<patch-array-json>' [--undo]   < state.json
//!   dojo-store get '<pointer>'                       < state.json
//!   dojo-store replay history.json [--initial '<state-json>']

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dojo_stores::cli::{apply_json_patch, init_logging, lookup, replay, CliError};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "dojo-store", about = "Patch-based JSON state store")]
struct Args {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, env = "DOJO_STORE_LOG", default_value = "warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply a patch to the state read from stdin.
    Apply {
        /// Patch operations as a JSON array.
        patch: String,
        /// Print `{"state", "undo"}` instead of the bare state.
        #[arg(long)]
        undo: bool,
    },
    /// Print the value at a pointer in the state read from stdin.
    Get { pointer: String },
    /// Rebuild state from a serialized history file.
    Replay {
        history: PathBuf,
        /// Starting state, `{}` when omitted.
        #[arg(long)]
        initial: Option<String>,
    },
}

fn read_stdin() -> Result<String, CliError> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn run(command: Command) -> Result<Value, CliError> {
    match command {
        Command::Apply { patch, undo } => apply_json_patch(read_stdin()?.trim(), &patch, undo),
        Command::Get { pointer } => lookup(read_stdin()?.trim(), &pointer),
        Command::Replay { history, initial } => {
            let text = std::fs::read_to_string(&history)?;
            replay(&text, initial.as_deref())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log);

    let output = run(args.command).and_then(|value| Ok(serde_json::to_string_pretty(&value)?));
    match output {
        Ok(text) => {
            let mut stdout = io::stdout().lock();
            if writeln!(stdout, "{text}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
