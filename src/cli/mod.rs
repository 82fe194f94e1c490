//! CLI module for rolecall
//!
//! Provides command-line interface for:
//! - serve: open the registry and handle chat commands from stdin
//! - inspect: print the stored snapshot
//! - check: verify the stored snapshot decodes
//! - pull: seed the local snapshot from the remote copy

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, inspect, pull, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{handle_line, ChatRequest, ChatResponse};
