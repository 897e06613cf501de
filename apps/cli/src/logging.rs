//! Tracing setup for the CLI

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "taverna";

/// Directory for rolling log files
///
/// `~/.local/share/taverna/logs` on Linux, `%LOCALAPPDATA%\taverna\logs` on Windows
pub fn logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taverna")
        .join("logs")
}

/// Install console and file logging.
///
/// - Console: compact, on stderr so command output stays clean
/// - File: daily rotation under [`logs_dir`], skipped if it cannot be created
///
/// The returned guard flushes the file writer on drop.
pub fn init_tracing() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,taverna_core=debug,taverna_soap=debug,taverna_cli=debug")
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .compact()
        .with_target(true);

    let (file_layer, guard) = match file_writer() {
        Ok((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Warning: file logging disabled: {}", e);
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn file_writer() -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), String> {
    let dir = logs_dir();
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("cannot create {}: {}", dir.display(), e))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(&dir)
        .map_err(|e| e.to_string())?;

    Ok(tracing_appender::non_blocking(appender))
}
