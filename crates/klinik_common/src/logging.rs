//! Logging setup for the Klinik services.
//!
//! All crates log through `tracing`. The binary calls [`init_from_config`] once at
//! startup; tests may call [`init_with_level`] repeatedly, later calls are no-ops.

use std::str::FromStr;

use klinik_config::LoggingConfig;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

const DEFAULT_FILE_PREFIX: &str = "klinik.log";

/// Initialize the tracing subscriber with a specific log level for the `klinik*` targets.
pub fn init_with_level(level: Level) {
    install(level, None);
}

/// Initialize logging from the `[logging]` section.
///
/// When a directory is configured, logs are also written to a daily rolling file.
/// The returned guard must be kept alive for the file writer to flush.
pub fn init_from_config(config: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let level = config
        .and_then(|c| c.level.as_deref())
        .and_then(|raw| Level::from_str(raw).ok())
        .unwrap_or(Level::INFO);
    let file = config.and_then(|c| {
        c.directory.as_deref().map(|dir| {
            (
                dir.to_string(),
                c.file_prefix
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string()),
            )
        })
    });
    install(level, file)
}

fn install(level: Level, file: Option<(String, String)>) -> Option<WorkerGuard> {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = Directive::from_str(&format!("klinik={}", level)) {
        filter = filter.add_directive(directive);
    }

    let (file_layer, guard) = match file {
        Some((directory, prefix)) => {
            let appender = tracing_appender::rolling::daily(directory, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    // try_init: a global subscriber may already be installed (tests)
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(file_layer)
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
    guard
}
