use crate::config::LoggingConfig;
use crate::error::{NewsCrawlError, Result};
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

pub fn init(config: &LoggingConfig) -> Result<()> {
    let subscriber = file_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber).map_err(|e| NewsCrawlError::Config {
        message: format!("Failed to install logger: {}", e),
    })
}

pub fn file_subscriber(config: &LoggingConfig) -> Result<impl Subscriber + Send + Sync + 'static> {
    if let Some(parent) = config.file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)?;

    Ok(tracing_subscriber::fmt()
        .with_env_filter(level_filter(&config.level)?)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .finish())
}

pub fn level_filter(level: &str) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(level),
    }
    .map_err(|e| NewsCrawlError::Config {
        message: format!("Invalid log level '{}': {}", level, e),
    })
}
