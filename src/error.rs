use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("grid mode requires GRID_USERNAME and GRID_ACCESS_KEY")]
    MissingGridCredentials,

    #[error("invalid grid hub URL: {0}")]
    InvalidHubUrl(String),

    #[error("max_articles must be at least 1")]
    ZeroArticles,
}

/// Errors surfaced by a page-automation session
#[derive(Debug, Error)]
pub enum DriverError {
    /// The locator matched nothing
    #[error("element not found: {0}")]
    NotFound(String),

    /// A bounded wait expired
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// No session could be established
    #[error("could not start WebDriver session: {0}")]
    Session(String),

    #[error("WebDriver command failed: {0}")]
    Command(String),
}

impl DriverError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to open listing page {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: DriverError,
    },

    /// No article block appeared within the wait window
    #[error("no article blocks appeared on {url} within {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("failed to enumerate article blocks: {0}")]
    Driver(#[from] DriverError),
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("RAPID_API_KEY is not set")]
    MissingCredential,

    #[error("translation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("translation response was not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("couldn't create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The URL has no usable final path segment
    #[error("cannot derive a filename from {0}")]
    InvalidName(String),

    #[error("image request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("image request to {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end a whole pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] DriverError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("environment task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}
