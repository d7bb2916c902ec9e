use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid chapter specification: {0}")]
    InvalidSpecification(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Failed to fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("File system error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl CrawlError {
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CrawlError::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        CrawlError::FetchFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
