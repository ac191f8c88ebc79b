use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create rolling file appender in '{dir}': {source}")]
    FileAppender {
        dir: String,
        #[source]
        source: InitError,
    },
    #[error("failed to initialize tracing: {0}")]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

/// Install the global subscriber. A subscriber that is already set is left in place.
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // 关键点流可能来自 stdin，日志统一写 stderr
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    let registry = Registry::default().with(env_filter).with(stderr_layer);

    if config.enable_file_logs {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("drowsiness-monitor")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&config.log_dir)
            .map_err(|source| LoggingError::FileAppender {
                dir: config.log_dir.clone(),
                source,
            })?;
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();
        allow_already_set(registry.with(file_layer).try_init())
    } else {
        allow_already_set(registry.try_init())
    }
}

// try_init 在全局 subscriber 已设置时返回错误，属于正常情况（如测试环境）
fn allow_already_set(result: Result<(), TryInitError>) -> Result<(), LoggingError> {
    match result {
        Err(e) if !e.to_string().contains("already been set") => Err(e.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let cfg = LogConfig::default();
        init_tracing(&cfg).unwrap();
        init_tracing(&cfg).unwrap();
    }

    #[test]
    fn unwritable_log_dir_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cfg = LogConfig {
            enable_file_logs: true,
            log_dir: file.path().join("logs").to_string_lossy().to_string(),
            ..LogConfig::default()
        };

        let result = init_tracing(&cfg);
        assert!(matches!(result, Err(LoggingError::FileAppender { .. })));
    }

    #[test]
    fn log_config_follows_app_config() {
        let mut app = Config::default();
        app.log_level = "debug".to_string();
        app.enable_file_logs = true;

        let cfg = LogConfig::from(&app);
        assert_eq!(cfg.log_level, "debug");
        assert!(cfg.enable_file_logs);
        assert_eq!(cfg.log_dir, "./logs");
    }
}
