use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::{format::FmtSpan, writer::BoxMakeWriter};

const LOG_FILE_PREFIX: &str = "timetracker";

/// Sends logs into a daily rolling file under `<application_data_path>/logs` at `RUST_LOG` level
/// (`info` when unset). With `console` everything down to trace goes to stderr instead, leaving
/// stdout to command output.
pub fn enable_logging(application_data_path: &Path, console: bool) -> Result<()> {
    let (writer, level) = if console {
        (BoxMakeWriter::new(std::io::stderr), LevelFilter::TRACE.to_string())
    } else {
        let appender = tracing_appender::rolling::Builder::new()
            .rotation(Rotation::DAILY)
            .max_log_files(5)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(application_data_path.join("logs"))?;
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
        (BoxMakeWriter::new(appender), level)
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .with_ansi(console)
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
