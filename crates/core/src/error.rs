// ABOUTME: Error types for fetching, source selection, configuration, store access and export.
// ABOUTME: PipelineError wraps the errors that can end a run.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the fetcher boundary. Sources convert these into an empty result.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure or timeout.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body exceeded the size limit.
    #[error("response from {url} is too large ({size} bytes)")]
    TooLarge { url: String, size: usize },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// A saved page could not be read from disk.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Creates a Transport error from an underlying client error.
    pub fn transport(url: impl Into<String>, err: impl fmt::Display) -> Self {
        FetchError::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    /// Returns true if the server answered with an error status.
    pub fn is_status(&self) -> bool {
        matches!(self, FetchError::Status { .. })
    }
}

/// Requested source names that are not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sources requested: {}", .unknown.join(", "))]
pub struct SelectionError {
    pub unknown: Vec<String>,
}

/// Errors building configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required variables are absent or empty.
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// The configuration source itself failed.
    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Errors talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure.
    #[error("record store request failed: {0}")]
    Http(String),

    /// The store rejected the request.
    #[error("record store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The store answered with an unexpected payload.
    #[error("unexpected record store response: {0}")]
    Decode(String),

    /// The store endpoint could not be built from the configuration.
    #[error("invalid record store URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    /// Creates an Http error from an underlying client error.
    pub fn http(err: impl fmt::Display) -> Self {
        StoreError::Http(err.to_string())
    }

    /// Creates a Decode error from an underlying parse error.
    pub fn decode(err: impl fmt::Display) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Errors writing the flat-file export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
