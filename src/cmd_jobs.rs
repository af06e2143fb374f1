//! Subcommand handlers for persistq.

use anyhow::{Context, bail};
use tracing::{info, warn};

use persistq_config::{Config, ConfigValidator};
use persistq_protocols::FilterAction;
use persistq_queue::JobQueue;

use crate::cli::JobCommand;

/// Validate the loaded configuration and print the findings.
pub(crate) fn check_config(config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config)?;

    for warning in &result.warnings {
        warn!("{}: {}", warning.path, warning.message);
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if !result.is_valid() {
        bail!("configuration has {} error(s)", result.errors.len());
    }
    println!("configuration ok");
    Ok(())
}

/// Handle job subcommands against the configured queue.
pub(crate) async fn handle_job_command(command: JobCommand, config: &Config) -> anyhow::Result<()> {
    let queue = JobQueue::open(config)
        .await
        .context("failed to open job queue")?;

    match command {
        JobCommand::Count => {
            println!("{}", queue.job_count().await?);
        }
        JobCommand::Peek { task } => {
            let job = match task.as_deref() {
                Some(task) => queue.next_job_for_task(task).await?,
                None => queue.next_job().await?,
            };
            match job {
                Some(job) => println!("{}", serde_json::to_string_pretty(&job)?),
                None => println!("queue is empty"),
            }
        }
        JobCommand::Exists { task } => {
            println!("{}", queue.job_exists_for_task(&task).await?);
        }
        JobCommand::Enqueue { task, data } => {
            let value: serde_json::Value = serde_json::from_str(&data)
                .with_context(|| format!("invalid JSON payload: {}", data))?;
            let id = queue.enqueue(&value, &task).await?;
            info!("Enqueued job {} for task {}", id, task);
            println!("{}", id);
        }
        JobCommand::Purge { yes } => {
            if !yes {
                bail!("refusing to purge without --yes");
            }
            let count = queue.job_count().await?;
            queue.empty().await?;
            println!("removed {} jobs", count);
        }
        JobCommand::DropWhere { field, value } => {
            let expected: serde_json::Value = serde_json::from_str(&value)
                .with_context(|| format!("invalid JSON value: {}", value))?;
            let removed = queue
                .filter_using_predicate(move |data| {
                    if data.get(&field) == Some(&expected) {
                        FilterAction::Delete
                    } else {
                        FilterAction::Keep
                    }
                })
                .await?;
            println!("removed {} jobs", removed);
        }
    }

    Ok(())
}
