// src/cli/handlers/mailchimp.rs

//! Commands: mailchimp-subscribe / mailchimp-unsubscribe / mailchimp-resubscribe
//!
//! Membership changes against the newsletter list, one task per email. A
//! rejected API call (member already exists, compliance state, ...) skips
//! that email with Mailchimp's reason instead of failing the run; only a
//! transport-level failure is fatal.

use crate::{
    cli::handlers::commons::{self, MailchimpArgs, MailchimpRunContext},
    core::task_runner::{self, RunOptions, Task},
    net::mailchimp::{ApiOutcome, rejection_title},
};
use anyhow::Result;
use clap::Parser;

use crate::core::config_store::FileStore;

/// What a membership task does to the member's subscription status.
#[derive(Debug, Clone, Copy)]
enum MembershipOp {
    Subscribe,
    Unsubscribe,
    Resubscribe,
}

impl MembershipOp {
    fn verb(self) -> &'static str {
        match self {
            Self::Subscribe => "Subscribe",
            Self::Unsubscribe => "Unsubscribe",
            Self::Resubscribe => "Resubscribe",
        }
    }
}

pub async fn handle_subscribe(args: Vec<String>, store: FileStore) -> Result<()> {
    handle(args, store, MembershipOp::Subscribe).await
}

pub async fn handle_unsubscribe(args: Vec<String>, store: FileStore) -> Result<()> {
    handle(args, store, MembershipOp::Unsubscribe).await
}

pub async fn handle_resubscribe(args: Vec<String>, store: FileStore) -> Result<()> {
    handle(args, store, MembershipOp::Resubscribe).await
}

async fn handle(args: Vec<String>, mut store: FileStore, op: MembershipOp) -> Result<()> {
    let args = MailchimpArgs::try_parse_from(&args)?;
    let (client, list) = commons::resolve_mailchimp_settings(&mut store, &args)?;

    let tasks: Vec<Task<MailchimpRunContext>> = args
        .emails
        .iter()
        .map(|email| {
            let client = client.clone();
            let list = list.clone();
            let email = email.clone();

            Task::new(
                format!("{} {}", op.verb(), email),
                move |context: task_runner::SharedContext<MailchimpRunContext>, handle| {
                let client = client.clone();
                let list = list.clone();
                let email = email.clone();
                async move {
                    let outcome = match op {
                        MembershipOp::Subscribe => client.subscribe(&list, &email).await?,
                        MembershipOp::Unsubscribe => {
                            client.set_status(&list, &email, "unsubscribed").await?
                        }
                        MembershipOp::Resubscribe => {
                            client.set_status(&list, &email, "subscribed").await?
                        }
                    };

                    if let ApiOutcome::Rejected(payload) = outcome {
                        let reason = rejection_title(&payload).to_string();
                        context.lock().unwrap().last_rejection = Some(payload);
                        handle.skip(reason);
                    }
                        Ok(())
                    }
                },
            )
        })
        .collect();

    // Sequential on purpose: Mailchimp rate-limits aggressively, and the
    // per-email order should match what the user typed.
    let context = task_runner::shared_context(MailchimpRunContext::default());
    task_runner::run(tasks, &context, RunOptions::sequential()).await?;

    if let Some(rejection) = &context.lock().unwrap().last_rejection {
        log::debug!("Last rejection payload from Mailchimp: {rejection}");
    }
    Ok(())
}
