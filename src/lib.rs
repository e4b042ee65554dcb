//! Regex-Crawler: a bounded-crawl pattern extractor
//!
//! This crate fetches a seed page (and optionally every same-origin page it
//! links to), applies a set of regular expressions to each body, and streams
//! every match to a consumer as soon as it is found. Searches run on a
//! background task and can be cancelled cooperatively.

pub mod config;
pub mod crawler;
pub mod patterns;
pub mod results;
pub mod session;
pub mod state;

use thiserror::Error;

/// Main error type for Regex-Crawler setup operations
///
/// Per-URL failures during a search never surface through this type; they
/// are delivered as [`results::SearchEvent`]s instead.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Search worker failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// Pattern registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("No built-in pattern named '{0}'")]
    NotFound(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    Invalid { pattern: String, message: String },

    #[error("Pattern name '{0}' is already registered")]
    Duplicate(String),
}

/// Result type alias for Regex-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlRequest, FetchError, FetchErrorKind, HttpFetcher, PageFetcher, SearchEngine};
pub use patterns::{Pattern, PatternRegistry};
pub use results::{InvalidRequest, MatchRecord, SearchEvent};
pub use session::{SearchHandle, Searcher};
pub use state::SearchState;
pub use tokio_util::sync::CancellationToken;
