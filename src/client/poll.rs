//! Export job status polling

use super::ExportClient;
use crate::error::{Error, Result};
use crate::types::{FileHandle, JobHandle, JobState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

impl ExportClient {
    /// Poll an export job until it reaches a terminal state
    ///
    /// Returns the [`FileHandle`] once the server reports a file id. The
    /// presence of `result.fileId` is the authoritative completion signal;
    /// the textual status is only consulted to distinguish "still running"
    /// from "failed" while no file id exists. A classified server error
    /// ends the loop immediately; retry policy lives with the caller, not
    /// inside the loop.
    ///
    /// Runs without a deadline. Callers wanting one wrap this in
    /// [`tokio::time::timeout`], as the pipeline orchestrator does.
    ///
    /// # Errors
    ///
    /// - [`Error::JobFailed`] when the server reports `failed` with no file id
    /// - [`Error::RemoteJob`] when a poll response classifies as an error
    /// - [`Error::Cancelled`] when `cancel` fires between polls
    pub async fn poll(&self, handle: &JobHandle, cancel: &CancellationToken) -> Result<FileHandle> {
        let poll_url = handle.poll_url();
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let response = self
                .http
                .get(&poll_url)
                .headers(handle.headers.clone())
                .send()
                .await?;
            let envelope = self.read_envelope(response).await?;
            let status = envelope.job_status();

            if let Some(file_id) = status.file_id {
                // fileId decides completion, whatever the status text says
                info!(survey = %handle.survey, file_id = %file_id, "export complete");
                return Ok(FileHandle { file_id });
            }
            if status.state == JobState::Failed {
                return Err(Error::JobFailed {
                    survey: handle.survey.to_string(),
                });
            }

            debug!(
                survey = %handle.survey,
                percent = status.percent_complete.unwrap_or(0),
                "export in progress"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(self.config.export.poll_interval) => {}
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use crate::classify::ErrorKind;
    use crate::client::ExportClient;
    use crate::config::{ApiConfig, Config};
    use crate::error::Error;
    use crate::options::ExportOptions;
    use crate::types::SurveyId;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Client with a short poll interval so tests finish quickly
    fn fast_client(server: &MockServer) -> ExportClient {
        let mut config = Config {
            api: ApiConfig {
                base_url: Some(server.uri()),
                api_token: Some("unit-test-token".into()),
                ..ApiConfig::default()
            },
            ..Config::default()
        };
        config.export.poll_interval = Duration::from_millis(10);
        ExportClient::new(config).expect("client construction")
    }

    async fn mount_submit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/surveys/SV_123456789012345/export-responses/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "progressId": "ES_poll" },
                "meta": { "httpStatus": "200 - OK" },
            })))
            .mount(server)
            .await;
    }

    fn poll_body(status: &str, file_id: Option<&str>, percent: f64) -> serde_json::Value {
        let mut result = serde_json::json!({ "status": status, "percentComplete": percent });
        if let Some(id) = file_id {
            result["fileId"] = serde_json::json!(id);
        }
        serde_json::json!({ "result": result, "meta": { "httpStatus": "200 - OK" } })
    }

    #[tokio::test]
    async fn poll_loops_until_file_id_appears() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        // First two polls report progress, the third carries the file id
        Mock::given(method("GET"))
            .and(path("/surveys/SV_123456789012345/export-responses/ES_poll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(poll_body("inProgress", None, 30.0)))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/surveys/SV_123456789012345/export-responses/ES_poll"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(poll_body("complete", Some("F_done"), 100.0)),
            )
            .mount(&server)
            .await;

        let client = fast_client(&server);
        let survey = SurveyId::new("SV_123456789012345").unwrap();
        let handle = client
            .submit(&survey, &ExportOptions::default())
            .await
            .unwrap();
        let file = client
            .poll(&handle, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(file.file_id, "F_done");
    }

    #[tokio::test]
    async fn file_id_wins_over_contradictory_status_text() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        // Status text still says in progress but the file id exists
        Mock::given(method("GET"))
            .and(path("/surveys/SV_123456789012345/export-responses/ES_poll"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(poll_body("inProgress", Some("F_early"), 90.0)),
            )
            .mount(&server)
            .await;

        let client = fast_client(&server);
        let survey = SurveyId::new("SV_123456789012345").unwrap();
        let handle = client
            .submit(&survey, &ExportOptions::default())
            .await
            .unwrap();
        let file = client
            .poll(&handle, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(file.file_id, "F_early");
    }

    #[tokio::test]
    async fn failed_without_file_id_is_job_failed() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/surveys/SV_123456789012345/export-responses/ES_poll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(poll_body("failed", None, 45.0)))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(&server);
        let survey = SurveyId::new("SV_123456789012345").unwrap();
        let handle = client
            .submit(&survey, &ExportOptions::default())
            .await
            .unwrap();
        let err = client
            .poll(&handle, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::JobFailed { survey } if survey == "SV_123456789012345"));
    }

    #[tokio::test]
    async fn classified_error_ends_the_loop_without_retry() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/surveys/SV_123456789012345/export-responses/ES_poll"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "meta": { "httpStatus": "503 - Temporary Internal Server Error" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(&server);
        let survey = SurveyId::new("SV_123456789012345").unwrap();
        let handle = client
            .submit(&survey, &ExportOptions::default())
            .await
            .unwrap();
        let err = client
            .poll(&handle, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteJob {
                kind: ErrorKind::TemporaryServerError,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancellation_stops_an_in_progress_poll() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        // Job never completes
        Mock::given(method("GET"))
            .and(path("/surveys/SV_123456789012345/export-responses/ES_poll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(poll_body("inProgress", None, 10.0)))
            .mount(&server)
            .await;

        let client = fast_client(&server);
        let survey = SurveyId::new("SV_123456789012345").unwrap();
        let handle = client
            .submit(&survey, &ExportOptions::default())
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let poller = {
            let client = client.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { client.poll(&handle, &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(25)).await;
        cancel.cancel();

        let err = poller.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
