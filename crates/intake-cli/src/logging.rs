use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/intake.log";

/// Console on stderr, so stdout carries only command output, plus a plain
/// file log. `TRACING_LEVEL` overrides the level picked from `-v`.
pub fn init_logger(verbosity: u8) -> impl Drop {
    let directive = filter_directive(env::var("TRACING_LEVEL").ok(), verbosity);
    let filter_layer = EnvFilter::new(&directive);

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (log_dir, log_file) = log_file_location(&log_file_path);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    debug!(
        "Logging at '{}' to stderr and {}",
        directive,
        log_dir.join(&log_file).display()
    );

    guard
}

fn filter_directive(from_env: Option<String>, verbosity: u8) -> String {
    if let Some(directive) = from_env.filter(|d| !d.trim().is_empty()) {
        return directive;
    }
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
    .to_string()
}

/// Split a log path into the directory the appender creates and the file
/// name inside it.
fn log_file_location(path: &str) -> (PathBuf, PathBuf) {
    let path = Path::new(path);
    let file = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("intake.log"));
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    (dir, file)
}
