// src/cli/mod.rs

use clap::Parser;

pub mod handlers;

/// sst: a command-line helper for recurring editorial chores.
///
/// The first argument selects a command from the registry in `bin/sst.rs`;
/// everything after it is handed to that command's own parser untouched.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// The command to run, followed by its arguments.
    #[arg()]
    pub args: Vec<String>,
}
