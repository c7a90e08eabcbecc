//! # qualtrics-dl
//!
//! Async client library for the Qualtrics response-export job API.
//!
//! ## Design Philosophy
//!
//! qualtrics-dl is designed to be:
//! - **Protocol-faithful** - Models the asynchronous export job exactly as
//!   the server runs it: submit, poll, then download
//! - **Sensible defaults** - Sequential exports with a 2-second poll
//!   cadence out of the box, concurrency opt-in
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Secrets-free** - Credentials come from configuration or the
//!   environment, never from source
//!
//! ## Quick Start
//!
//! ```no_run
//! use qualtrics_dl::{Config, ExportClient, ExportOptions, ExportPipeline, SurveyRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Token read from QUALTRICS_API_TOKEN
//!     let config = Config::default();
//!     let client = ExportClient::new(config)?;
//!
//!     let registry = SurveyRegistry::from_entries([
//!         ("SV_2sF0lL5xtQXIne6", "Chat & Social Evaluation"),
//!         ("SV_3HFLHRXEuuiAXrw", "Inbound Evaluation"),
//!     ])?;
//!
//!     let options = ExportOptions {
//!         use_labels: Some(true),
//!         ..ExportOptions::default()
//!     };
//!
//!     let pipeline = ExportPipeline::new(client);
//!     for outcome in pipeline.run(&registry, &options).await {
//!         match outcome.result {
//!             Ok(archive) => println!("{}: {} bytes", outcome.name, archive.len()),
//!             Err(e) => eprintln!("{}: {}", outcome.name, e),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Server error classification
pub mod classify;
/// Export API client (decomposed into focused submodules)
pub mod client;
/// Configuration types
pub mod config;
/// Credential and endpoint construction
pub mod credentials;
/// Error types
pub mod error;
/// Nested JSON traversal helpers
pub mod json_tree;
/// Export option validation and payload construction
pub mod options;
/// Multi-survey export orchestration
pub mod pipeline;
/// Survey registry
pub mod registry;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use classify::{ErrorKind, classify};
pub use client::{DownloadStream, ExportClient};
pub use config::{ApiConfig, Config, ExportConfig, RetryConfig};
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use json_tree::{extract_keys, extract_values};
pub use options::ExportOptions;
pub use pipeline::{ExportPipeline, SurveyOutcome};
pub use registry::{SurveyEntry, SurveyRegistry};
pub use retry::{IsRetryable, with_retry};
pub use types::{
    ApiResponseEnvelope, FileHandle, JobHandle, JobState, JobStatus, ResponseId, SurveyId,
};
