//! Error handling for congress-control
//!
//! Defines the typed failures of each pipeline stage and establishes a unified
//! Result type using anyhow for context chaining at the binary boundary.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Chamber;
use crate::scraping::rules::Strategy;

/// A source page could not be retrieved
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Status { url, .. } | FetchError::Transport { url, .. } => url,
        }
    }

    /// Whether another attempt could plausibly succeed (transport trouble, 429, 5xx)
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Transport { .. } => true,
        }
    }
}

/// An extraction rule could not be satisfied by the page text
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not find \"{label}\" on the {chamber} page ({strategy} rule)")]
    MissingLabel {
        chamber: Chamber,
        label: String,
        strategy: Strategy,
    },

    #[error("\"{label}\" on the {chamber} page has an unusable count: {value}")]
    InvalidCount {
        chamber: Chamber,
        label: String,
        value: String,
    },

    #[error("label \"{label}\" does not form a usable pattern: {message}")]
    InvalidPattern { label: String, message: String },
}

/// Extracted counts do not add up to the chamber's seat total.
///
/// Non-fatal unless strict totals are requested.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{chamber} counts add up to {actual} seats, expected {expected}")]
pub struct ConsistencyWarning {
    pub chamber: Chamber,
    pub expected: u32,
    pub actual: u32,
}

/// Configuration could not be loaded or is invalid
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in config file {}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error for a pipeline run
#[derive(Error, Debug)]
pub enum CongressError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} (strict totals enabled)")]
    Inconsistent(ConsistencyWarning),

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("failed to serialize snapshot")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write snapshot to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read snapshot from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the binary's glue code
pub type Result<T> = anyhow::Result<T>;
