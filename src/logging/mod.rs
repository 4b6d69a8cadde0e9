//! Logging initialization: stdout plus an optional non-blocking rolling
//! file appender, driven by `LoggingConfig` (SPEC_FULL.md §C).

use crate::config::{LogRotation, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Must be kept alive for the lifetime of the process — dropping it stops
/// the background flush thread for the file appender.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides
/// `logging.level` when set, matching the teacher's env-override precedence.
pub fn init(config: &LoggingConfig) -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let stdout_layer = fmt::layer().with_target(true);

    let (file_layer, file_guard) = if config.file_enabled {
        let rotation = match config.file_rotation {
            LogRotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
            LogRotation::Daily => tracing_appender::rolling::Rotation::DAILY,
            LogRotation::Never => tracing_appender::rolling::Rotation::NEVER,
        };
        let appender = tracing_appender::rolling::RollingFileAppender::new(
            rotation,
            &config.file_dir,
            format!("{}.log", config.file_prefix),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_ansi(false).with_writer(non_blocking)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    LoggingGuard {
        _file_guard: file_guard,
    }
}
