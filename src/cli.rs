//! CLI definitions for persistq.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// persistq CLI.
#[derive(Parser)]
#[command(name = "persistq")]
#[command(about = "Inspect and manage a durable job queue")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "persistq.toml", env = "PERSISTQ_CONFIG", global = true)]
    pub config: PathBuf,

    /// Queue database path (overrides the configuration)
    #[arg(long, env = "PERSISTQ_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Validate the configuration file
    CheckConfig,

    #[command(flatten)]
    Job(JobCommand),
}

#[derive(Subcommand)]
pub(crate) enum JobCommand {
    /// Print the number of pending jobs
    Count,

    /// Show the next pending job
    Peek {
        /// Only consider jobs for this task
        #[arg(long)]
        task: Option<String>,
    },

    /// Check whether any pending job exists for a task
    Exists {
        task: String,
    },

    /// Add a job to the queue
    Enqueue {
        task: String,

        /// JSON payload
        #[arg(default_value = "null")]
        data: String,
    },

    /// Remove every pending job
    Purge {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },

    /// Remove pending jobs whose payload field equals a JSON value
    DropWhere {
        /// Top-level payload field
        field: String,

        /// JSON value to match
        value: String,
    },
}
