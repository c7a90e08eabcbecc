//! Response classification
//!
//! The export API embeds a textual HTTP-status-like descriptor inside its
//! JSON envelope (`meta.httpStatus`), distinct from the transport-level HTTP
//! status code. [`classify`] is a pure function over that descriptor and is
//! the single place the rest of the crate consults to decide whether an
//! envelope represents a server-reported failure.

use crate::types::ApiResponseEnvelope;
use serde::{Deserialize, Serialize};

/// Closed set of server-reported failure kinds
///
/// `BadRequest`, `Unauthorized`, and `Forbidden` are permanent from the
/// client's point of view and must be surfaced to the operator. The server
/// errors (`InternalServerError`, `TemporaryServerError`, `GatewayTimeout`)
/// and `TooManyRequests` are transient; callers may re-run the whole
/// submit-then-poll sequence for those.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 400 — something about the request was invalid
    BadRequest,
    /// 401 — the API user could not be authenticated
    Unauthorized,
    /// 403 — authenticated but not authorized for this resource
    Forbidden,
    /// 429 — request rate exceeded; only produced from the transport status
    TooManyRequests,
    /// 500 — internal server error
    InternalServerError,
    /// 503 — temporary internal server error
    TemporaryServerError,
    /// 504 — gateway timeout
    GatewayTimeout,
    /// Any other non-success transport status; never produced by [`classify`]
    Unknown,
}

impl ErrorKind {
    /// Whether re-running the whole submit-then-poll sequence may succeed
    ///
    /// Retry policy is the caller's responsibility; the poll loop itself
    /// never retries (see the poller docs).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InternalServerError
                | ErrorKind::TemporaryServerError
                | ErrorKind::GatewayTimeout
                | ErrorKind::TooManyRequests
        )
    }

    /// Map a transport-level HTTP status code to an error kind
    ///
    /// Used when the transport status is already a failure before any
    /// envelope can be read. Unrecognized non-success codes map to
    /// [`ErrorKind::Unknown`] rather than being silently treated as success.
    pub fn from_transport_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            429 => ErrorKind::TooManyRequests,
            500 => ErrorKind::InternalServerError,
            503 => ErrorKind::TemporaryServerError,
            504 => ErrorKind::GatewayTimeout,
            _ => ErrorKind::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::TooManyRequests => "too many requests",
            ErrorKind::InternalServerError => "internal server error",
            ErrorKind::TemporaryServerError => "temporary internal server error",
            ErrorKind::GatewayTimeout => "gateway timeout",
            ErrorKind::Unknown => "unknown server error",
        };
        write!(f, "{}", name)
    }
}

/// Classify an envelope's status descriptor
///
/// String-exact match against the six descriptors the service is known to
/// emit. An absent or unrecognized descriptor returns `None`, meaning
/// success. Unknown 4xx/5xx descriptors therefore pass as success; that gap
/// is deliberate, and transport-level status checking in the client covers
/// the common cases the descriptor misses.
pub fn classify(envelope: &ApiResponseEnvelope) -> Option<ErrorKind> {
    match envelope.http_status()? {
        "500 - Internal Server Error" => Some(ErrorKind::InternalServerError),
        "503 - Temporary Internal Server Error" => Some(ErrorKind::TemporaryServerError),
        "504 - Gateway Timeout" => Some(ErrorKind::GatewayTimeout),
        "400 - Bad Request" => Some(ErrorKind::BadRequest),
        "401 - Unauthorized" => Some(ErrorKind::Unauthorized),
        "403 - Forbidden" => Some(ErrorKind::Forbidden),
        _ => None,
    }
}
