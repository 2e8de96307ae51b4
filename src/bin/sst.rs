// src/bin/sst.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;
use sst::{
    cli::{Cli, handlers},
    core::config_store::FileStore,
};

// --- Command Definition and Registry ---

/// Defines a command, its aliases, and the short description shown by the
/// command listing.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    about: &'static str,
}

/// The single source of truth for all commands. Adding a command means adding
/// an entry here and a matching arm in `dispatch`.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "retriever",
        aliases: &[],
        about: "Upload files to the Retriever FTP server",
    },
    CommandDefinition {
        name: "mailchimp-subscribe",
        aliases: &["subscribe"],
        about: "Subscribe an email to the newsletter",
    },
    CommandDefinition {
        name: "mailchimp-unsubscribe",
        aliases: &["unsubscribe"],
        about: "Unsubscribe a member of the newsletter",
    },
    CommandDefinition {
        name: "mailchimp-resubscribe",
        aliases: &["resubscribe"],
        about: "Resubscribe a member of the newsletter",
    },
    CommandDefinition {
        name: "subscribers-add",
        aliases: &[],
        about: "Add new subscribers and wait until they are confirmed",
    },
    CommandDefinition {
        name: "clear",
        aliases: &[],
        about: "Clear all stored configuration",
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Entry point: sets up logging, routes to the requested command, and
/// performs centralized error handling.
#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()).await {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let mut args = cli.args.into_iter();
    let Some(command_name) = args.next() else {
        print_available_commands();
        return Ok(());
    };
    let command_args: Vec<String> = args.collect();

    let Some(command) = find_command(&command_name) else {
        eprintln!("\nInvalid command: {}", command_name.red());
        print_available_commands();
        std::process::exit(1);
    };

    let store = FileStore::open_default()?;
    dispatch(command.name, command_args, store).await
}

async fn dispatch(name: &'static str, args: Vec<String>, store: FileStore) -> Result<()> {
    match name {
        "retriever" => handlers::retriever::handle(args, store).await,
        "mailchimp-subscribe" => handlers::mailchimp::handle_subscribe(args, store).await,
        "mailchimp-unsubscribe" => handlers::mailchimp::handle_unsubscribe(args, store).await,
        "mailchimp-resubscribe" => handlers::mailchimp::handle_resubscribe(args, store).await,
        "subscribers-add" => handlers::subscribers::handle(args, store).await,
        "clear" => handlers::clear::handle(args, store).await,
        other => Err(anyhow!("Internal error: unhandled command '{other}'.")),
    }
}

fn print_available_commands() {
    println!("\nAvailable commands:");
    for command in COMMAND_REGISTRY {
        println!("  {:<24} {}", command.name.green().bold(), command.about);
    }
    println!(
        "\nSee {} for the options of a single command.",
        "sst <command> --help".green().bold()
    );
}
