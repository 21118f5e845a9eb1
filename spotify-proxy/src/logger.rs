//! Console + daily-rolling file logging.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "spotify-proxy.log";

/// Timestamps in local time, RFC 3339.
struct LocalTimer;

impl fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().to_rfc3339())
    }
}

/// `<data_dir>/logs`, created if missing.
pub fn log_dir(data_dir: &Path) -> std::io::Result<PathBuf> {
    let dir = data_dir.join("logs");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Keep the returned guard alive for as long as file logging
/// should flush.
pub fn init_logger(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let mut guard = None;
    let mut file_layer = None;

    if let Some(dir) = log_dir {
        if is_log_dir_writable(dir) {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (writer, g) = tracing_appender::non_blocking(appender);
            guard = Some(g);
            file_layer = Some(
                fmt::Layer::new()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(LocalTimer),
            );
        } else {
            eprintln!("log directory {} is not writable, logging to console only", dir.display());
        }
    }

    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(LocalTimer);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if guard.is_some() {
        info!("logging to console and file");
    } else {
        info!("logging to console");
    }
    guard
}

fn is_log_dir_writable(dir: &Path) -> bool {
    let probe = dir.join(".write_test");
    let result = fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&probe)
        .and_then(|mut f| f.write_all(b"ok"));

    if result.is_ok() {
        let _ = fs::remove_file(probe);
        true
    } else {
        false
    }
}
