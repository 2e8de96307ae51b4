// src/cli/handlers/subscribers.rs

//! Command: subscribers-add
//!
//! Adds a batch of emails as brand-new subscribers, one task per email. New
//! members can take a moment to show up in list queries, so after a
//! successful create the task polls the member endpoint until Mailchimp
//! reports the address subscribed.

use crate::{
    cli::handlers::commons::{self, MailchimpArgs, MailchimpRunContext},
    core::{
        config_store::FileStore,
        poll::{self, RetryPolicy},
        task_runner::{self, RunOptions, Task},
    },
    net::mailchimp::{ApiOutcome, rejection_title},
};
use anyhow::Result;
use clap::Parser;

pub async fn handle(args: Vec<String>, mut store: FileStore) -> Result<()> {
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
                format!("Subscribe {email}"),
                move |context: task_runner::SharedContext<MailchimpRunContext>, handle| {
                let client = client.clone();
                let list = list.clone();
                let email = email.clone();
                async move {
                    let outcome = client.add_member(&list, &email).await?;

                    if let ApiOutcome::Rejected(payload) = outcome {
                        let reason = rejection_title(&payload).to_lowercase();
                        context.lock().unwrap().last_rejection = Some(payload);
                        handle.skip(format!(
                            "Could not subscribe {email} (reason: {reason})"
                        ));
                        return Ok(());
                    }

                    // Confirm the member is actually visible as subscribed
                    // before reporting success.
                    poll::wait_for(
                        || async { Ok(client.member(&list, &email).await?) },
                        |member| member.status == "subscribed",
                        RetryPolicy::default(),
                    )
                    .await?;
                        Ok(())
                    }
                },
            )
        })
        .collect();

    let context = task_runner::shared_context(MailchimpRunContext::default());
    task_runner::run(tasks, &context, RunOptions::sequential()).await?;

    if let Some(rejection) = &context.lock().unwrap().last_rejection {
        log::debug!("Last rejection payload from Mailchimp: {rejection}");
    }
    Ok(())
}
