//! Viewer error types

use chess_core::ParseError;
use thiserror::Error;

/// Failure of an outbound call. Cloneable so that every caller awaiting a
/// shared in-flight request receives the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request error: {0}")]
    Request(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Invalid PGN: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No game loaded")]
    NoGameLoaded,

    #[error("Annotation text cannot be empty")]
    EmptyAnnotation,

    #[error("Game ID must be exactly 8 characters")]
    InvalidMasterGameId,

    #[error("Request superseded by a newer load")]
    Superseded,

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(&'static str),
}
