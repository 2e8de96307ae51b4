// src/cli/handlers/retriever.rs

//! Command: retriever
//!
//! Uploads a list of files to the root of an ftp-url. Mainly used to push a
//! batch of pdf-files to an external service once a month.
//!
//! On the first run you are prompted for a username, password and url, which
//! are stored in the config store (`~/.config/sst/config.json`). Use the
//! `--username`, `--password` and `--url` flags to skip being prompted.

use crate::{
    constants::RETRIEVER_CONFIG_KEY,
    core::{
        config_resolver::{self, require_str},
        config_store::{ConfigMap, FileStore},
        prompter::{Question, TerminalPrompter},
        task_runner::{self, RunOptions, SkipDecision, Task},
    },
    system::transfer,
};
use anyhow::{Result, anyhow};
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    about = "Upload files to the Retriever FTP server."
)]
struct RetrieverArgs {
    /// Files to upload; only existing .pdf files are accepted.
    #[arg(required = true)]
    files: Vec<String>,

    /// Provide a username (will be asked for if not stored).
    #[arg(long)]
    username: Option<String>,

    /// Provide a password (will be asked for if not stored).
    #[arg(long)]
    password: Option<String>,

    /// Provide an ftp:// url (will be asked for if not stored).
    #[arg(long)]
    url: Option<String>,

    /// Override stored config and prompt for new input.
    #[arg(short = 'o', long)]
    override_config: bool,
}

fn questions() -> Vec<Question> {
    vec![
        Question::text("username", "Username").with_validator(|input| {
            if input.is_empty() {
                Err("Username must be defined".to_string())
            } else {
                Ok(())
            }
        }),
        Question::secret("password", "Password").with_validator(|input| {
            if input.is_empty() {
                Err("Password must be defined".to_string())
            } else {
                Ok(())
            }
        }),
        Question::text("url", "Url").with_validator(|input| {
            if input.starts_with("ftp://") {
                Ok(())
            } else {
                Err("An ftp-url must start with ftp://".to_string())
            }
        }),
    ]
}

pub async fn handle(args: Vec<String>, mut store: FileStore) -> Result<()> {
    let args = RetrieverArgs::try_parse_from(&args)?;

    let mut overrides = ConfigMap::new();
    if let Some(username) = &args.username {
        overrides.insert("username".to_string(), Value::String(username.clone()));
    }
    if let Some(password) = &args.password {
        overrides.insert("password".to_string(), Value::String(password.clone()));
    }
    if let Some(url) = &args.url {
        overrides.insert("url".to_string(), Value::String(url.clone()));
    }

    let config = config_resolver::resolve(
        &mut store,
        &TerminalPrompter,
        RETRIEVER_CONFIG_KEY,
        &overrides,
        questions(),
        args.override_config,
    )?;

    let username = require_str(&config, "username")?.to_string();
    let password = require_str(&config, "password")?.to_string();
    let url = require_str(&config, "url")?.to_string();

    // One task per file. Uploads are independent, so they run concurrently
    // and a failing transfer never blocks its siblings.
    let tasks: Vec<Task<()>> = args
        .files
        .iter()
        .map(|file| {
            let path = PathBuf::from(file);
            let action_path = path.clone();
            let (username, password, url) = (username.clone(), password.clone(), url.clone());

            Task::new(format!("Upload {file}"), move |_context, _handle| {
                let path = action_path.clone();
                let (username, password, url) = (username.clone(), password.clone(), url.clone());
                async move {
                    transfer::upload_file(&path, &username, &password, &url).await?;
                    Ok(())
                }
            })
            .with_skip(move |_context| {
                let path = path.clone();
                async move { check_uploadable(&path).await }
            })
        })
        .collect();

    let context = task_runner::shared_context(());
    let summary = task_runner::run(tasks, &context, RunOptions::concurrent()).await?;

    if summary.failed() > 0 {
        return Err(anyhow!("{} upload(s) failed.", summary.failed()));
    }
    Ok(())
}

/// A file qualifies when it exists, is a regular file, and is a pdf.
async fn check_uploadable(path: &Path) -> SkipDecision {
    match tokio::fs::metadata(path).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            SkipDecision::Skip("No such file".to_string())
        }
        Err(e) => SkipDecision::Skip(e.to_string()),
        Ok(meta) if !meta.is_file() => {
            SkipDecision::Skip("The specified path is not a file".to_string())
        }
        Ok(_) => {
            let is_pdf = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if is_pdf {
                SkipDecision::Proceed
            } else {
                SkipDecision::Skip("File must be a pdf-file".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_files_are_skipped_with_a_reason() {
        let dir = tempdir().unwrap();
        let decision = check_uploadable(&dir.path().join("nope.pdf")).await;
        assert_eq!(decision, SkipDecision::Skip("No such file".to_string()));
    }

    #[tokio::test]
    async fn directories_are_not_uploadable() {
        let dir = tempdir().unwrap();
        let decision = check_uploadable(dir.path()).await;
        assert_eq!(
            decision,
            SkipDecision::Skip("The specified path is not a file".to_string())
        );
    }

    #[tokio::test]
    async fn non_pdf_files_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, b"hello").unwrap();

        let decision = check_uploadable(&path).await;
        assert_eq!(
            decision,
            SkipDecision::Skip("File must be a pdf-file".to_string())
        );
    }

    #[tokio::test]
    async fn pdf_files_proceed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        assert_eq!(check_uploadable(&path).await, SkipDecision::Proceed);
    }
}
