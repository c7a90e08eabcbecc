//! Core types for qualtrics-dl

use crate::error::{Error, Result};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Expected length of a survey identifier
const SURVEY_ID_LEN: usize = 18;

/// Expected length of a response identifier
const RESPONSE_ID_LEN: usize = 17;

/// Validated survey identifier (`SV_` followed by 15 alphanumeric characters)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct SurveyId(String);

impl SurveyId {
    /// Validate and wrap a survey identifier
    ///
    /// The id must be exactly 18 characters and start with `SV_`. The id is
    /// visible in the survey platform under account settings.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.len() != SURVEY_ID_LEN {
            return Err(Error::validation(format!(
                "survey id must be exactly {SURVEY_ID_LEN} characters, got {} ({id:?})",
                id.len()
            )));
        }
        if !id.starts_with("SV_") {
            return Err(Error::validation(format!(
                "survey id must start with \"SV_\", got {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Get the inner id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SurveyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SurveyId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SurveyId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

/// Validated single-response identifier (`R_` followed by 15 characters)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ResponseId(String);

impl ResponseId {
    /// Validate and wrap a response identifier (17 characters, `R_` prefix)
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.len() != RESPONSE_ID_LEN {
            return Err(Error::validation(format!(
                "response id must be exactly {RESPONSE_ID_LEN} characters, got {} ({id:?})",
                id.len()
            )));
        }
        if !id.starts_with("R_") {
            return Err(Error::validation(format!(
                "response id must start with \"R_\", got {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Get the inner id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResponseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ResponseId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

/// Terminal-or-not state of a server-side export job
///
/// The server only ever moves a job forward: in-progress, then complete or
/// failed. The client never observes (or enforces) a regression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// The export is still being materialized server-side
    InProgress,
    /// The export finished and a file id is available
    Complete,
    /// The server gave up on the export
    Failed,
}

impl JobState {
    /// Interpret the textual `result.status` field
    ///
    /// Anything other than the two terminal strings counts as in-progress;
    /// the server has emitted variants like "in progress" and "inProgress".
    pub fn from_wire(status: &str) -> Self {
        match status {
            "complete" => JobState::Complete,
            "failed" => JobState::Failed,
            _ => JobState::InProgress,
        }
    }
}

/// Point-in-time view of a polled export job
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobStatus {
    /// Current job state as reported by the server
    pub state: JobState,
    /// File id, present only once the export output exists
    pub file_id: Option<String>,
    /// Best-effort progress percentage; the server does not guarantee
    /// monotonicity
    pub percent_complete: Option<u8>,
}

/// Handle to a running export job
///
/// Created by `submit`, consumed by exactly one polling loop, never
/// persisted. Carries everything the poller and downloader need so that
/// concurrent pipelines share no mutable state.
#[derive(Clone, Debug)]
pub struct JobHandle {
    /// The survey the job was submitted for
    pub survey: SurveyId,
    /// Opaque progress token issued by the remote service
    pub progress_id: String,
    /// The export endpoint the job was created against, with trailing slash
    /// (poll and download URLs are derived from it)
    pub export_url: String,
    /// Request headers carrying authentication for this job
    pub headers: HeaderMap,
}

impl JobHandle {
    /// URL polled for job status
    pub fn poll_url(&self) -> String {
        format!("{}{}", self.export_url, self.progress_id)
    }

    /// URL the completed output file is downloaded from
    pub fn download_url(&self, file: &FileHandle) -> String {
        format!("{}{}/file", self.export_url, file.file_id)
    }
}

/// Token identifying a completed export's output artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHandle {
    /// Opaque file id issued by the remote service on completion
    pub file_id: String,
}

/// The JSON envelope every export API response arrives in
///
/// Only `meta` is interpreted structurally; `result` is kept as raw JSON
/// because the protocol reads at most four well-known keys out of it
/// (`progressId`/`id`, `status`, `fileId`, `percentComplete`) and the
/// nested-structure helpers in [`crate::json_tree`] can walk the rest when
/// diagnostics call for it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiResponseEnvelope {
    /// Response metadata, including the textual status descriptor
    #[serde(default)]
    pub meta: EnvelopeMeta,
    /// Operation result payload, shape varies per endpoint
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// The `meta` object of a response envelope
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EnvelopeMeta {
    /// Textual HTTP-status-like descriptor, e.g. "400 - Bad Request"
    #[serde(rename = "httpStatus")]
    pub http_status: Option<String>,
    /// Error code/message pair, present on failures
    pub error: Option<EnvelopeError>,
    /// Request id for support correlation
    #[serde(rename = "requestId")]
    pub request_id: Option<String>,
}

/// The `meta.error` object of a failed response envelope
#[derive(Clone, Debug, Deserialize)]
pub struct EnvelopeError {
    /// Machine-readable error code
    #[serde(rename = "errorCode")]
    pub code: Option<String>,
    /// Human-readable error message
    #[serde(rename = "errorMessage")]
    pub message: Option<String>,
}

impl ApiResponseEnvelope {
    /// The textual status descriptor, if the envelope carries one
    pub fn http_status(&self) -> Option<&str> {
        self.meta.http_status.as_deref()
    }

    fn result_str(&self, key: &str) -> Option<&str> {
        self.result.as_ref()?.get(key)?.as_str()
    }

    /// Extract the progress id a job-creation response carries
    ///
    /// The current API reports it as `result.progressId`; older envelope
    /// versions used `result.id`, which is accepted as a fallback.
    pub fn progress_id(&self) -> Option<&str> {
        self.result_str("progressId").or_else(|| self.result_str("id"))
    }

    /// Extract `result.fileId`, the authoritative completion signal
    pub fn file_id(&self) -> Option<&str> {
        self.result_str("fileId")
    }

    /// Extract the textual `result.status` field
    pub fn status(&self) -> Option<&str> {
        self.result_str("status")
    }

    /// Extract `result.percentComplete`, clamped into 0..=100
    pub fn percent_complete(&self) -> Option<u8> {
        let raw = self.result.as_ref()?.get("percentComplete")?;
        // The server has emitted both integers and floats here
        let value = raw.as_f64()?;
        Some(value.clamp(0.0, 100.0) as u8)
    }

    /// Build a [`JobStatus`] snapshot from a poll response
    pub fn job_status(&self) -> JobStatus {
        JobStatus {
            state: self
                .status()
                .map(JobState::from_wire)
                .unwrap_or(JobState::InProgress),
            file_id: self.file_id().map(str::to_owned),
            percent_complete: self.percent_complete(),
        }
    }
}
