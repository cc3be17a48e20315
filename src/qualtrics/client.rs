//! HTTP client for the Qualtrics survey export API.
//!
//! Token-header authentication, JSON over HTTPS, one round trip per
//! method. Each call carries its own request timeout; the download
//! timeout is deliberately longer than the other two.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::debug;

use crate::config::QualtricsConfig;
use crate::error::{Error, Result};
use crate::qualtrics::ExportApi;
use crate::qualtrics::types::{
    ExportProgress, ExportStatusResponse, SingleResponseEnvelope, StartExportResponse,
};

const API_TOKEN_HEADER: &str = "X-API-TOKEN";

/// Client for one survey's export-responses endpoints.
pub struct QualtricsClient {
    http: reqwest::Client,
    config: QualtricsConfig,
}

impl QualtricsClient {
    /// Build a client from a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API token is not a valid header
    /// value or the HTTP client cannot be constructed.
    pub fn new(config: QualtricsConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(&config.api_token)
            .map_err(|_| Error::Config("API token contains invalid header characters".into()))?;
        token.set_sensitive(true);
        headers.insert(API_TOKEN_HEADER, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Fetch a single response by id (webhook push path).
    ///
    /// Returns the response's `result` object serialized as JSON, in the
    /// same shape the extractor produces, so it can go straight into
    /// `upsert`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` on network failure or a non-success
    /// status.
    pub async fn fetch_response(&self, response_id: &str) -> Result<String> {
        let url = format!("{}/responses/{response_id}", self.config.base_url);
        debug!(url = %url, "Fetching single response");

        let response = self
            .http
            .get(&url)
            .timeout(self.config.download_timeout)
            .send()
            .await?;

        let response = check_status(response, "response fetch").await?;
        let envelope: SingleResponseEnvelope = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("failed to parse response body: {e}")))?;

        Ok(envelope.result.to_string())
    }
}

impl ExportApi for QualtricsClient {
    async fn start_export(&self) -> Result<String> {
        let url = format!("{}/export-responses/", self.config.base_url);
        debug!(url = %url, "Starting export job");

        let response = self
            .http
            .post(&url)
            .timeout(self.config.start_timeout)
            .json(&serde_json::json!({ "format": "csv" }))
            .send()
            .await?;

        let response = check_status(response, "export start").await?;
        let envelope: StartExportResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("failed to parse export start body: {e}")))?;

        Ok(envelope.result.progress_id)
    }

    async fn poll_status(&self, progress_id: &str) -> Result<ExportProgress> {
        let url = format!("{}/export-responses/{progress_id}", self.config.base_url);

        let response = self
            .http
            .get(&url)
            .timeout(self.config.status_timeout)
            .send()
            .await?;

        let response = check_status(response, "status check").await?;
        let envelope: ExportStatusResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("failed to parse status body: {e}")))?;

        Ok(envelope.result)
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/export-responses/{file_id}/file", self.config.base_url);
        debug!(url = %url, "Downloading export archive");

        let response = self
            .http
            .get(&url)
            .timeout(self.config.download_timeout)
            .send()
            .await?;

        let response = check_status(response, "download").await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Map a non-success HTTP status to a transport error with context.
async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Transport(format!("{what} failed: {status} {body}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> QualtricsConfig {
        QualtricsConfig::from_parts(Some("test-token".into()), None, None, Some(base_url)).unwrap()
    }

    async fn client_for(server: &MockServer) -> QualtricsClient {
        QualtricsClient::new(test_config(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn start_export_posts_csv_format_and_returns_progress_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/export-responses/"))
            .and(header("X-API-TOKEN", "test-token"))
            .and(body_json(serde_json::json!({ "format": "csv" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "progressId": "ES_progress1" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let progress_id = client.start_export().await.unwrap();
        assert_eq!(progress_id, "ES_progress1");
    }

    #[tokio::test]
    async fn start_export_maps_http_failure_to_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/export-responses/"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.start_export().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn poll_status_parses_in_progress_descriptor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export-responses/ES_p"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "percentComplete": 42.0 }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let progress = client.poll_status("ES_p").await.unwrap();
        assert!(!progress.is_complete());
        assert!(progress.file_id.is_none());
    }

    #[tokio::test]
    async fn poll_status_parses_terminal_descriptor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export-responses/ES_p"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "percentComplete": 100.0, "fileId": "file-9" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let progress = client.poll_status("ES_p").await.unwrap();
        assert!(progress.is_complete());
        assert_eq!(progress.file_id.as_deref(), Some("file-9"));
    }

    #[tokio::test]
    async fn download_returns_raw_bytes() {
        let server = MockServer::start().await;
        let archive = vec![0x50, 0x4b, 0x03, 0x04, 0xff];
        Mock::given(method("GET"))
            .and(path("/export-responses/file-9/file"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.clone()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let bytes = client.download("file-9").await.unwrap();
        assert_eq!(bytes, archive);
    }

    #[tokio::test]
    async fn fetch_response_returns_result_object_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/responses/R_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "responseId": "R_1", "values": { "Q1": "yes" } }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let payload = client.fetch_response("R_1").await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed["responseId"], "R_1");
        assert_eq!(parsed["values"]["Q1"], "yes");
    }
}
