//! Error types for bugscan
//!
//! `BugscanError` covers setup and I/O problems that can end a run.
//! `ProbeError` describes why a single probe produced no HTTP response;
//! it never ends a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BugscanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for bugscan operations
pub type BugscanResult<T> = Result<T, BugscanError>;

/// Transport-level failure classes for a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The connection could not be established.
    ConnectionError,
    /// Connected, but the response was not read within the budget.
    ReadTimeout,
    /// The overall request deadline expired.
    RequestTimeout,
    /// The peer answered with something that is not a parsable HTTP response.
    MalformedResponse,
}

impl FailureKind {
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ConnectionError => "connection-error",
            FailureKind::ReadTimeout => "read-timeout",
            FailureKind::RequestTimeout => "request-timeout",
            FailureKind::MalformedResponse => "malformed-response",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed probe attempt, as reported by a `Transport`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ProbeError {
    pub kind: FailureKind,
    pub message: String,
}

impl ProbeError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ConnectionError, message)
    }

    pub fn read_timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ReadTimeout, message)
    }

    pub fn request_timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RequestTimeout, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, message)
    }
}
