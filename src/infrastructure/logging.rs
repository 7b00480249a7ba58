//! Global tracing setup driven by [`LogSettings`].
//!
//! Console and rolling-file outputs toggle independently; the filter
//! comes from `RUST_LOG` when set, the configured level otherwise.

use anyhow::Context;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::domain::settings::LogSettings;

/// Keeps the file writer's flush worker alive. Dropping this loses any
/// buffered log lines, so hold it for the life of the process.
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

fn rotation_for(name: &str) -> Rotation {
    match name.to_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "minutely" => Rotation::MINUTELY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

/// Installs the global subscriber. Fails if one is already installed,
/// so call it once at startup.
pub fn init_logger(settings: &LogSettings) -> anyhow::Result<LoggingGuard> {
    let mut guards = Vec::new();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = settings.console_logging_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(settings.show_target)
            .with_ansi(settings.ansi_colors)
    });

    let file = if settings.file_logging_enabled {
        let appender = tracing_appender::rolling::RollingFileAppender::new(
            rotation_for(&settings.rotation),
            &settings.log_dir,
            &settings.file_name_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(settings.show_target),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("install global logger")?;

    tracing::info!("logging initialized");

    Ok(LoggingGuard { _guards: guards })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_rotation_falls_back_to_daily() {
        assert_eq!(rotation_for("hourly"), Rotation::HOURLY);
        assert_eq!(rotation_for("NEVER"), Rotation::NEVER);
        assert_eq!(rotation_for("weekly"), Rotation::DAILY);
        assert_eq!(rotation_for(""), Rotation::DAILY);
    }

    #[test]
    fn installs_global_logger_exactly_once() {
        let settings = LogSettings {
            console_logging_enabled: false,
            file_logging_enabled: true,
            log_dir: std::env::temp_dir()
                .join("wii-remote-log-smoke")
                .to_string_lossy()
                .into_owned(),
            ..LogSettings::default()
        };

        let guard = init_logger(&settings);
        assert!(guard.is_ok());
        // The global subscriber slot is taken now.
        assert!(init_logger(&settings).is_err());
    }
}
