use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::CliError;

const LOG_FILE_PREFIX: &str = "golfcap";

/// Log to stderr, and to a daily file under `log_dir` when given.
///
/// The returned guard flushes the file writer on drop and must live until
/// the process exits.
pub fn init(log_dir: Option<PathBuf>) -> Result<Option<WorkerGuard>, CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(filter)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(&dir).map_err(|source| CliError::LogDir {
        path: dir.clone(),
        source,
    })?;
    let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
    Ok(Some(guard))
}
