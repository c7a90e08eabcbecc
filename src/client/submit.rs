//! Export job submission

use super::ExportClient;
use crate::error::{Error, Result};
use crate::options::ExportOptions;
use crate::types::{JobHandle, SurveyId};
use tracing::{debug, info};

impl ExportClient {
    /// Create an export job for a survey
    ///
    /// Validates the options, posts them to the survey's export endpoint,
    /// and returns a [`JobHandle`] carrying the progress id the status
    /// endpoint is keyed by. The job runs server-side from here; nothing is
    /// downloaded yet.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] when the options are inconsistent
    /// - [`Error::RemoteJob`] when the server rejects the request
    /// - [`Error::MalformedEnvelope`] when an ok response carries no
    ///   progress id
    pub async fn submit(&self, survey: &SurveyId, options: &ExportOptions) -> Result<JobHandle> {
        let payload = options.to_payload()?;
        let export_url = self.export_url(survey)?;
        let headers = self.export_headers()?;

        debug!(survey = %survey, url = %export_url, "creating export job");
        let response = self
            .http
            .post(&export_url)
            .headers(headers.clone())
            .json(&payload)
            .send()
            .await?;
        let envelope = self.read_envelope(response).await?;

        let progress_id = envelope
            .progress_id()
            .ok_or_else(|| {
                Error::malformed("export creation succeeded but the response has no progress id")
            })?
            .to_string();

        info!(survey = %survey, progress_id = %progress_id, "export job created");
        Ok(JobHandle {
            survey: survey.clone(),
            progress_id,
            export_url,
            headers,
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use crate::classify::ErrorKind;
    use crate::client::tests::test_client;
    use crate::error::Error;
    use crate::options::ExportOptions;
    use crate::types::SurveyId;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn survey() -> SurveyId {
        SurveyId::new("SV_123456789012345").unwrap()
    }

    #[tokio::test]
    async fn submit_posts_options_and_returns_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/surveys/SV_123456789012345/export-responses/"))
            .and(header("x-api-token", "unit-test-token"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "format": "csv",
                "limit": 2,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "progressId": "ES_abc123", "percentComplete": 0.0 },
                "meta": { "httpStatus": "200 - OK" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let options = ExportOptions {
            limit: Some(2),
            ..ExportOptions::default()
        };
        let handle = client.submit(&survey(), &options).await.unwrap();

        assert_eq!(handle.progress_id, "ES_abc123");
        assert_eq!(
            handle.poll_url(),
            format!(
                "{}/surveys/SV_123456789012345/export-responses/ES_abc123",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn submit_accepts_legacy_result_id_field() {
        // Older API deployments return the progress id under result.id
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/surveys/SV_123456789012345/export-responses/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "id": "ES_legacy" },
                "meta": { "httpStatus": "200 - OK" },
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let handle = client
            .submit(&survey(), &ExportOptions::default())
            .await
            .unwrap();
        assert_eq!(handle.progress_id, "ES_legacy");
    }

    #[tokio::test]
    async fn submit_rejects_inconsistent_options_without_a_request() {
        let server = MockServer::start().await;
        // No mock mounted: a request would 404 and fail differently

        let client = test_client(&server);
        let options = ExportOptions {
            use_labels: Some(true),
            include_label_columns: Some(true),
            ..ExportOptions::default()
        };
        let err = client.submit(&survey(), &options).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn submit_surfaces_classified_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/surveys/SV_123456789012345/export-responses/"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "meta": {
                    "httpStatus": "500 - Internal Server Error",
                    "error": { "errorCode": "ISE_0", "errorMessage": "boom" },
                },
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .submit(&survey(), &ExportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteJob {
                kind: ErrorKind::InternalServerError,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn ok_envelope_without_progress_id_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/surveys/SV_123456789012345/export-responses/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "percentComplete": 0.0 },
                "meta": { "httpStatus": "200 - OK" },
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .submit(&survey(), &ExportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope { .. }));
    }
}
