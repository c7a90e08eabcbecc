//! Export API client (decomposed into focused submodules)
//!
//! [`ExportClient`] owns the HTTP client and resolved credentials and
//! exposes the three protocol operations: [`submit`](ExportClient::submit),
//! [`poll`](ExportClient::poll), and [`download`](ExportClient::download),
//! plus the single-response lookup. Every response passes through one
//! envelope-reading path so that classification is applied uniformly.

mod download;
mod poll;
mod submit;

pub use download::DownloadStream;

use crate::classify::{self, ErrorKind};
use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::types::{ApiResponseEnvelope, ResponseId, SurveyId};
use tracing::warn;

/// Client for the response-export job API
///
/// Cheap to clone; the underlying HTTP connection pool is shared across
/// clones, which is how concurrent pipelines share transport without
/// sharing any mutable state.
#[derive(Clone, Debug)]
pub struct ExportClient {
    http: reqwest::Client,
    credentials: Credentials,
    config: Config,
}

impl ExportClient {
    /// Create a client from configuration
    ///
    /// Validates the configuration, resolves credentials (config or
    /// environment), and builds the shared HTTP client with the configured
    /// per-request timeout.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let credentials = Credentials::from_config(&config.api)?;
        let http = reqwest::Client::builder()
            .timeout(config.export.request_timeout)
            .build()
            .map_err(Error::Transport)?;
        Ok(Self {
            http,
            credentials,
            config,
        })
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch a single recorded response as raw JSON
    ///
    /// Issues one GET against the survey's response resource and returns
    /// the `result` mapping. The caller typically inspects it with the
    /// [`crate::json_tree`] helpers. Server errors are classified like any
    /// other envelope; 503/504 can be retried through
    /// [`crate::retry::with_retry`].
    pub async fn fetch_response(
        &self,
        survey: &SurveyId,
        response_id: &ResponseId,
    ) -> Result<serde_json::Value> {
        let url = self
            .credentials
            .base_url(&format!("surveys/{survey}/responses/{response_id}"), false)?;
        let headers = self.credentials.headers(true)?;

        let response = self.http.get(&url).headers(headers).send().await?;
        let envelope = self.read_envelope(response).await?;
        envelope
            .result
            .ok_or_else(|| Error::malformed("response lookup returned no result payload"))
    }

    /// Endpoint for a survey's export jobs, with trailing slash
    pub(crate) fn export_url(&self, survey: &SurveyId) -> Result<String> {
        self.credentials
            .base_url(&format!("surveys/{survey}/export-responses/"), false)
    }

    /// Request headers for export operations
    pub(crate) fn export_headers(&self) -> Result<reqwest::header::HeaderMap> {
        self.credentials.headers(true)
    }

    /// Parse a response into an envelope and classify it
    ///
    /// The envelope's own status descriptor wins when it classifies as an
    /// error; otherwise a non-success transport status is mapped through
    /// [`ErrorKind::from_transport_status`] so unknown failures surface as
    /// [`ErrorKind::Unknown`] instead of being mistaken for data.
    pub(crate) async fn read_envelope(
        &self,
        response: reqwest::Response,
    ) -> Result<ApiResponseEnvelope> {
        let transport_status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<ApiResponseEnvelope>(&body) {
            Ok(envelope) => {
                if let Some(kind) = classify::classify(&envelope) {
                    let descriptor = envelope.http_status().unwrap_or_default().to_string();
                    if let Some(error) = &envelope.meta.error {
                        warn!(
                            code = error.code.as_deref().unwrap_or("-"),
                            message = error.message.as_deref().unwrap_or("-"),
                            "server reported error"
                        );
                    }
                    return Err(Error::remote(kind, descriptor));
                }
                if !transport_status.is_success() {
                    return Err(Error::remote(
                        ErrorKind::from_transport_status(transport_status),
                        transport_status.to_string(),
                    ));
                }
                Ok(envelope)
            }
            Err(parse_err) => {
                // A non-JSON body on an error status is a gateway page or
                // similar; classify by transport status
                if !transport_status.is_success() {
                    return Err(Error::remote(
                        ErrorKind::from_transport_status(transport_status),
                        transport_status.to_string(),
                    ));
                }
                Err(Error::Serialization(parse_err))
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, RetryConfig};
    use crate::retry::with_retry;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Client pointed at a mock server instead of the real data center
    pub(crate) fn test_client(server: &MockServer) -> ExportClient {
        let config = Config {
            api: ApiConfig {
                base_url: Some(server.uri()),
                api_token: Some("unit-test-token".into()),
                ..ApiConfig::default()
            },
            ..Config::default()
        };
        ExportClient::new(config).expect("client construction")
    }

    #[tokio::test]
    async fn read_envelope_passes_success_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "status": "complete" },
                "meta": { "httpStatus": "200 - OK" },
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = reqwest::get(format!("{}/ok", server.uri())).await.unwrap();
        let envelope = client.read_envelope(response).await.unwrap();
        assert_eq!(envelope.status(), Some("complete"));
    }

    #[tokio::test]
    async fn read_envelope_classifies_descriptor_even_on_200() {
        // The envelope descriptor wins regardless of transport status
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/err"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "meta": {
                    "httpStatus": "403 - Forbidden",
                    "error": { "errorCode": "AUTH_1", "errorMessage": "no access" },
                },
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = reqwest::get(format!("{}/err", server.uri())).await.unwrap();
        let err = client.read_envelope(response).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteJob {
                kind: ErrorKind::Forbidden,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn read_envelope_maps_transport_429_to_too_many_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "meta": { "httpStatus": "429 - Too Many Requests" },
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = reqwest::get(format!("{}/limited", server.uri()))
            .await
            .unwrap();
        // "429 - ..." is not one of the six envelope descriptors, so the
        // transport status supplies the classification
        let err = client.read_envelope(response).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteJob {
                kind: ErrorKind::TooManyRequests,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn read_envelope_maps_non_json_error_body_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateway"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = reqwest::get(format!("{}/gateway", server.uri()))
            .await
            .unwrap();
        let err = client.read_envelope(response).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteJob {
                kind: ErrorKind::Unknown,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn read_envelope_rejects_non_json_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = reqwest::get(format!("{}/html", server.uri()))
            .await
            .unwrap();
        let err = client.read_envelope(response).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn fetch_response_returns_the_result_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/surveys/SV_123456789012345/responses/R_123456789012345",
            ))
            .and(header("x-api-token", "unit-test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "responseId": "R_123456789012345", "values": { "QID1": 5 } },
                "meta": { "httpStatus": "200 - OK" },
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let survey = SurveyId::new("SV_123456789012345").unwrap();
        let response_id = ResponseId::new("R_123456789012345").unwrap();
        let result = client.fetch_response(&survey, &response_id).await.unwrap();
        assert_eq!(result["values"]["QID1"], 5);
    }

    #[tokio::test]
    async fn transient_fetch_response_failure_is_retried() {
        let server = MockServer::start().await;
        // First lookup fails with a retryable kind, second succeeds
        Mock::given(method("GET"))
            .and(path(
                "/surveys/SV_123456789012345/responses/R_123456789012345",
            ))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "meta": { "httpStatus": "503 - Temporary Internal Server Error" },
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(
                "/surveys/SV_123456789012345/responses/R_123456789012345",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "responseId": "R_123456789012345", "values": { "QID1": 7 } },
                "meta": { "httpStatus": "200 - OK" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let survey = SurveyId::new("SV_123456789012345").unwrap();
        let response_id = ResponseId::new("R_123456789012345").unwrap();
        let retry = RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        let result = with_retry(&retry, || client.fetch_response(&survey, &response_id))
            .await
            .unwrap();
        assert_eq!(result["values"]["QID1"], 7);
    }
}
