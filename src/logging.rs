use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging with a formatted console layer and a daily-rolling
/// JSON file layer under `logs/`. The returned guard must be held for the
/// lifetime of the process so buffered file output is flushed on exit.
pub fn init_logging() -> WorkerGuard {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "etl.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("health_etl=info".parse().unwrap()))
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
