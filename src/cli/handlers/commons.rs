// src/cli/handlers/commons.rs

use crate::{
    constants::MAILCHIMP_CONFIG_KEY,
    core::{
        config_resolver::{self, require_str},
        config_store::{ConfigMap, FileStore},
        prompter::{Question, TerminalPrompter},
    },
    net::mailchimp::{self, MailchimpClient},
};
use anyhow::Result;
use clap::Parser;
use serde_json::Value;

/// Arguments shared by every newsletter command.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct MailchimpArgs {
    /// Email addresses to process, in order.
    #[arg(required = true)]
    pub emails: Vec<String>,

    /// Provide an API key (will be asked for if not stored).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Provide a list id (will be asked for if not stored).
    #[arg(long)]
    pub list: Option<String>,

    /// Override stored config and prompt for new input.
    #[arg(short = 'o', long)]
    pub override_config: bool,
}

/// Run context shared by the newsletter tasks: the last API rejection
/// payload, kept around for diagnostics after the run. Only one task writes
/// at a time (runs are sequential), so last-write-wins is fine.
#[derive(Debug, Default)]
pub struct MailchimpRunContext {
    pub last_rejection: Option<Value>,
}

fn mailchimp_questions() -> Vec<Question> {
    vec![
        Question::text("api_key", "API key").with_validator(mailchimp::validate_api_key),
        Question::text("list", "List ID").with_validator(|input| {
            if input.is_empty() {
                Err("List ID must be defined".to_string())
            } else {
                Ok(())
            }
        }),
    ]
}

/// Resolves the shared `mailchimp` settings group and builds the API client
/// from it. Client construction re-checks the key shape: flag-supplied or
/// hand-edited keys bypass the prompt-time validator.
pub fn resolve_mailchimp_settings(
    store: &mut FileStore,
    args: &MailchimpArgs,
) -> Result<(MailchimpClient, String)> {
    let mut overrides = ConfigMap::new();
    if let Some(api_key) = &args.api_key {
        overrides.insert("api_key".to_string(), Value::String(api_key.clone()));
    }
    if let Some(list) = &args.list {
        overrides.insert("list".to_string(), Value::String(list.clone()));
    }

    let config = config_resolver::resolve(
        store,
        &TerminalPrompter,
        MAILCHIMP_CONFIG_KEY,
        &overrides,
        mailchimp_questions(),
        args.override_config,
    )?;

    let client = MailchimpClient::new(require_str(&config, "api_key")?)?;
    let list = require_str(&config, "list")?.to_string();
    Ok((client, list))
}
