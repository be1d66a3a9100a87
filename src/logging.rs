use thiserror::Error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "house-stats-backend";
const MAX_LOG_FILES: usize = 30;

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

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("failed to create rolling file appender in {dir}: {source}")]
    Appender {
        dir: String,
        #[source]
        source: tracing_appender::rolling::InitError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Installs the global subscriber. Calling it again after a subscriber is
/// already installed (tests, embedded use) is a no-op.
pub fn init_tracing(config: &LogConfig) -> Result<(), LogInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let registry = Registry::default().with(env_filter).with(stdout_layer);

    let result = if config.enable_file_logs {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .max_log_files(MAX_LOG_FILES)
            .build(&config.log_dir)
            .map_err(|source| LogInitError::Appender {
                dir: config.log_dir.clone(),
                source,
            })?;
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();
        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    };

    match result {
        Ok(()) => Ok(()),
        // 已有全局 subscriber 属于正常情况（测试环境）
        Err(e) if e.to_string().contains("already been set") => Ok(()),
        Err(e) => Err(LogInitError::Subscriber(e.to_string())),
    }
}
