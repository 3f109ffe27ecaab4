use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbFetchError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("{count} downloads failed")]
    DownloadsFailed { count: usize },

    #[error("Directory creation failed at {path}: {reason}")]
    DirectoryCreateFailed { path: PathBuf, reason: String },

    #[error("Failed to decompress {path}: {reason}")]
    DecompressionFailed { path: PathBuf, reason: String },

    #[error("No column header starts with {pattern:?}")]
    ColumnNotFound { pattern: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid resource request {url}: {reason}")]
    InvalidRequest { url: String, reason: String },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}

