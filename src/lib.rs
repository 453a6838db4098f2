//! Jewel-Scout: resilient catalog page acquisition and jewellery text normalization
//!
//! This crate loads product listing pages from jewellery storefronts through a
//! robots-aware pair of upstream browser proxies, and normalizes the free-text
//! product names it finds into canonical metal/karat and diamond-weight values.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod listing;
pub mod normalize;
pub mod robots;

use crate::crawler::ProxyKind;
use thiserror::Error;

/// Main error type for Jewel-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failures raised by the browser capability layer
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to connect to browser at {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("Page operation failed: {0}")]
    Page(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Browser session is closed")]
    Closed,
}

/// Failures of a single navigation attempt
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Navigation to {url} timed out")]
    Timeout { url: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Ready marker '{selector}' did not appear")]
    MarkerTimeout { selector: String },

    #[error(transparent)]
    Hard(#[from] BrowserError),
}

impl NavigationError {
    /// Returns true if another attempt may succeed
    ///
    /// Timeouts and navigation errors are transient. A broken session is not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Hard(_))
    }
}

/// Why one proxy candidate was abandoned
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("{proxy} proxy could not open a browser: {source}")]
    Browser {
        proxy: ProxyKind,
        #[source]
        source: BrowserError,
    },

    #[error("{proxy} proxy could not load the page: {source}")]
    Navigation {
        proxy: ProxyKind,
        #[source]
        source: NavigationError,
    },
}

/// Failures surfaced by page acquisition
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("All proxies failed for {url}; last error: {last}")]
    ProxyExhausted {
        url: String,
        #[source]
        last: CandidateError,
    },

    #[error("Invalid target URL {url}: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: ::url::ParseError,
    },
}

/// Result type alias for Jewel-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlTarget, ProxyStrategy, ScrapeSession};
pub use normalize::{extract_diawt_value, extract_kt_value};
