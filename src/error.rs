//! Error types for qualtrics-dl
//!
//! This module provides the error taxonomy for the export workflow:
//! - `Validation` — the caller supplied malformed input; fix the call, never retry
//! - `RemoteJob` — the server reported a classified failure (see [`ErrorKind`])
//! - `JobFailed` — the server reached a terminal "failed" status without a file
//! - `Transport` — a network-level failure underneath the API protocol
//!
//! No error branch ever swallows a failure into a log call; every fallible
//! operation returns a typed error to its caller.

use crate::classify::ErrorKind;
use thiserror::Error;

/// Result type alias for qualtrics-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qualtrics-dl
///
/// Each variant includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied malformed input (bad survey id, conflicting options)
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description of what was malformed
        message: String,
    },

    /// The server reported a classified failure in its response envelope
    #[error("remote job error ({kind}): {status}")]
    RemoteJob {
        /// The classified error kind
        kind: ErrorKind,
        /// The original status descriptor text, kept for diagnostics
        status: String,
    },

    /// The export job reached terminal "failed" status without producing a file
    #[error("export job failed for survey {survey}")]
    JobFailed {
        /// The survey whose export job failed
        survey: String,
    },

    /// Network-level failure (connect, timeout, TLS, body read)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The envelope parsed but is missing a field the protocol requires
    #[error("malformed response envelope: {message}")]
    MalformedEnvelope {
        /// What was missing or ill-shaped
        message: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_token")
        key: Option<String>,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The pipeline was cancelled before the job reached a terminal state
    #[error("export cancelled")]
    Cancelled,

    /// The caller-supplied deadline elapsed while the job was still running
    #[error("poll deadline elapsed after {elapsed_secs}s")]
    DeadlineElapsed {
        /// How long the poller ran before the deadline cut it off
        elapsed_secs: u64,
    },
}

impl Error {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a malformed-envelope failure
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedEnvelope {
            message: message.into(),
        }
    }

    /// Build a `RemoteJob` error from a classified kind, keeping the
    /// descriptor text for diagnostics.
    pub fn remote(kind: ErrorKind, status: impl Into<String>) -> Self {
        Error::RemoteJob {
            kind,
            status: status.into(),
        }
    }
}
