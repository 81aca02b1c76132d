//! Tracing setup for hosts embedding the engine.
//!
//! Logs go to stderr at the configured level; optionally a session file in
//! the user cache directory captures the full DEBUG-level trail (the
//! engine's state transitions: session on/off, frame push/pop, lookup
//! misses). Old session files are cleaned up on startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::UtcOffset;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{self, fmt, prelude::*};

const LOG_RETENTION_DAYS: u64 = 7;

/// Log directory in the user-specific OS cache directory:
/// - Linux: ~/.cache/quaver/completion-engine/
/// - macOS: ~/Library/Caches/quaver/completion-engine/
/// - Windows: %LOCALAPPDATA%\quaver\completion-engine\
fn log_dir() -> io::Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "unable to determine user cache directory")
    })?;

    let dir = cache_dir.join("quaver").join("completion-engine");
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Remove session logs older than `LOG_RETENTION_DAYS`.
fn cleanup_old_logs(dir: &Path) {
    let now = std::time::SystemTime::now();
    let retention = std::time::Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);

    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else { continue };
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !(name.starts_with("session-") && name.ends_with(".log")) {
            continue;
        }
        if let Ok(modified) = metadata.modified() {
            if now.duration_since(modified).is_ok_and(|age| age > retention) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    eprintln!("failed to remove old log file {:?}: {}", entry.path(), e);
                }
            }
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Returns a guard that must be kept alive for the duration of the program
/// so the non-blocking file writer flushes on exit.
///
/// # Arguments
/// * `no_color` - disable ANSI colors in stderr output
/// * `log_level` - override the stderr level (otherwise `RUST_LOG`, default
///   "info")
/// * `enable_file_logging` - write a DEBUG-level session file to the cache
///   directory (disable for tests)
pub fn init_logger(
    no_color: bool,
    log_level: Option<&str>,
    enable_file_logging: bool,
) -> io::Result<WorkerGuard> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!(
            "[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"
        ),
    );

    let stderr_filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    let result;
    let guard;
    if enable_file_logging {
        let dir = log_dir()?;
        cleanup_old_logs(&dir);

        let timestamp = time::OffsetDateTime::now_utc()
            .format(
                &time::format_description::parse("[year][month][day]-[hour][minute][second]")
                    .expect("static format description"),
            )
            .expect("UTC timestamp formats");
        let log_path = dir.join(format!("session-{}-{}.log", timestamp, std::process::id()));

        let file = fs::OpenOptions::new().create(true).append(true).open(&log_path)?;
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file);
        guard = file_guard;

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_timer(timer)
            .with_ansi(false)
            .with_filter(tracing_subscriber::EnvFilter::new("debug"));

        result = tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init();
    } else {
        let (_, sink_guard) = tracing_appender::non_blocking(std::io::sink());
        guard = sink_guard;
        result = tracing_subscriber::registry().with(stderr_layer).try_init();
    }

    match result {
        Ok(()) => Ok(guard),
        // A subscriber set by the host (or an earlier test) is fine.
        Err(e) if e.to_string().contains("already been set") => Ok(guard),
        Err(e) => Err(io::Error::other(e)),
    }
}
