// src/cli/handlers/clear.rs

//! Command: clear
//!
//! Wipes every stored configuration namespace at once. Useful when something
//! is not working as expected and you want a clean first-run state.

use crate::core::{
    config_store::{ConfigStore, FileStore},
    task_runner::{self, RunOptions, SkipDecision, Task},
};
use anyhow::Result;
use clap::Parser;
use dialoguer::{Confirm, theme::ColorfulTheme};

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    about = "Clear all stored data, useful if something is not working as expected."
)]
struct ClearArgs {}

pub async fn handle(args: Vec<String>, store: FileStore) -> Result<()> {
    let _ = ClearArgs::try_parse_from(&args)?;

    let should_clear = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Are you sure you want to clear all stored configurations?")
        .default(false)
        .interact()?;

    let context = task_runner::shared_context(store);
    task_runner::run(
        vec![build_clear_task(should_clear)],
        &context,
        RunOptions::sequential(),
    )
    .await?;
    Ok(())
}

/// The store itself is the run context, so the task can mutate it and the
/// caller could still inspect it afterwards.
fn build_clear_task(should_clear: bool) -> Task<FileStore> {
    Task::new(
        "Clear user configurations",
        |context: task_runner::SharedContext<FileStore>, handle| async move {
            context.lock().unwrap().clear()?;
            handle.set_title("User configurations removed");
            Ok(())
        },
    )
    .with_skip(move |_context| async move {
        if should_clear {
            SkipDecision::Proceed
        } else {
            SkipDecision::Skip("Aborted by user".to_string())
        }
    })
}
