use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "showtime_finder.log";
const DEFAULT_FILTER: &str = "showtime_finder=info,warn";

/// Console plus daily-rotated JSON file output for searches and fetches.
///
/// `RUST_LOG` overrides the default filter. Safe to call more than once;
/// only the first subscriber is installed.
pub fn init_logging() {
    let _ = fs::create_dir_all(LOG_DIR);

    let (file_writer, flush_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();

    // dropping the guard stops the background writer; it lives for the process
    std::mem::forget(flush_guard);
}
