//! persistq - command line tool for durable job queues.

mod cli;
mod cmd_jobs;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use persistq_config::{ConfigLoader, LogFormat, LoggingConfig, StorageBackend};

use cli::{Cli, Commands};

/// Initialize tracing with console output and an optional rolling log file.
///
/// Console output goes to stderr so command output on stdout stays clean.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    let console = match logging.format {
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    let (file_layer, guard) = match logging.resolved_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("persistq")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    if let Some(db) = cli.db {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = Some(db.to_string_lossy().into_owned());
    }

    // Keep the file writer alive until exit.
    let _guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::CheckConfig => cmd_jobs::check_config(&config),
        Commands::Job(command) => cmd_jobs::handle_job_command(command, &config).await,
    }
}
