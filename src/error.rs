use crate::article::ExtractError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsCrawlError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Header schema error: {message}")]
    HeaderSchema { message: String },

    #[error("Invalid interval field {field}: {value}")]
    InvalidInterval { field: &'static str, value: u32 },

    #[error("Batch not found: {url}")]
    BatchMissing { url: String },

    #[error("Failed to fetch batch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Malformed batch line: {reason}")]
    MalformedLine { reason: String },

    #[error("Article not available: {url}")]
    DocumentUnavailable {
        url: String,
        #[source]
        source: ExtractError,
    },

    #[error("Batch archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl NewsCrawlError {
    /// Errors that must stop the process before any interval is processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NewsCrawlError::Config { .. }
                | NewsCrawlError::HeaderSchema { .. }
                | NewsCrawlError::InvalidInterval { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for NewsCrawlError {
    fn user_message(&self) -> String {
        match self {
            NewsCrawlError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            NewsCrawlError::HeaderSchema { message } => {
                format!("Invalid header list: {}", message)
            }
            NewsCrawlError::InvalidInterval { field, value } => {
                format!("Value {} is out of range for {}", value, field)
            }
            NewsCrawlError::BatchMissing { url } => {
                format!("No batch published at {}", url)
            }
            NewsCrawlError::Transport { url, message } => {
                format!("Could not download {}: {}", url, message)
            }
            NewsCrawlError::DocumentUnavailable { url, source } => {
                format!("Article not available: {} ({})", url, source)
            }
            NewsCrawlError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            NewsCrawlError::Config { .. } | NewsCrawlError::InvalidInterval { .. } => Some(
                "Check your configuration file syntax and value ranges, or run with --generate-config for a template.".to_string()
            ),
            NewsCrawlError::HeaderSchema { .. } => Some(
                "The header file needs one column name per line, including DATE, DocumentIdentifier and TranslationInfo.".to_string()
            ),
            NewsCrawlError::Transport { .. } => Some(
                "Check your internet connection. Completed intervals are skipped, so re-running resumes where this run stopped.".to_string()
            ),
            NewsCrawlError::Io(_) => Some(
                "Ensure the output and scratch directories are writable.".to_string()
            ),
            NewsCrawlError::Cancelled => Some(
                "Run the same command again to resume; finished intervals are not downloaded twice.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for NewsCrawlError {
    fn from(error: toml::de::Error) -> Self {
        NewsCrawlError::Config {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for NewsCrawlError {
    fn from(error: serde_json::Error) -> Self {
        NewsCrawlError::Config {
            message: error.to_string(),
        }
    }
}

impl From<tempfile::PersistError> for NewsCrawlError {
    fn from(error: tempfile::PersistError) -> Self {
        NewsCrawlError::Io(error.error)
    }
}

pub type Result<T> = std::result::Result<T, NewsCrawlError>;
