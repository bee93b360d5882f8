use crate::config::LoggingSettings;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup logging with a daily rotating file appender and optional console output.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `settings.level`.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(
    settings: &LoggingSettings,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_path = ensure_log_dir(&settings.dir)?;

    let file_appender = rolling::daily(&log_path, &settings.prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = build_filter(&settings.level)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = settings.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, level={}, console={}",
        settings.dir,
        settings.prefix,
        settings.level,
        settings.console
    );

    Ok(guard)
}

fn ensure_log_dir(dir: &str) -> Result<Utf8PathBuf> {
    let log_path = Utf8PathBuf::from(dir);
    if !log_path.exists() {
        fs::create_dir_all(&log_path)
            .with_context(|| format!("Failed to create log directory: {}", dir))?;
    }
    Ok(log_path)
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level directive: {}", level)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_directory_created() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");

        let created = ensure_log_dir(log_dir.to_str().unwrap()).unwrap();

        assert!(created.exists());
    }

    #[test]
    fn test_filter_accepts_directives() {
        assert!(build_filter("debug").is_ok());
        assert!(build_filter("modelstore=trace,info").is_ok());
    }

    #[test]
    fn test_setup_logging_installs_once() {
        let temp_dir = TempDir::new().unwrap();
        let settings = LoggingSettings {
            dir: temp_dir.path().join("logs").to_str().unwrap().to_string(),
            prefix: "test".to_string(),
            level: "info".to_string(),
            console: false,
        };

        // The only test in this binary that installs a global subscriber
        let guard = setup_logging(&settings);
        assert!(guard.is_ok());

        let second = setup_logging(&settings);
        assert!(second.is_err());
    }
}
