//! HTTP adapter for the job-status API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::TransportError;
use crate::model::{FinalResult, JobId, JobStatusResponse, YieldPoint};
use crate::ports::StatusPort;

/// Request timeout for status/result calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reqwest-backed implementation of [`StatusPort`].
#[derive(Debug, Clone)]
pub struct HttpStatusClient {
    client: Client,
    base_url: String,
}

impl HttpStatusClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StatusPort for HttpStatusClient {
    async fn fetch_status(&self, job: &JobId) -> Result<JobStatusResponse, TransportError> {
        self.get_json(&format!("/jobs/{job}/status")).await
    }

    async fn fetch_yield_points(
        &self,
        job: &JobId,
        page: u32,
        limit: u32,
    ) -> Result<Vec<YieldPoint>, TransportError> {
        self.get_json(&format!("/jobs/{job}/yield-points?page={page}&limit={limit}"))
            .await
    }

    async fn fetch_result(&self, job: &JobId) -> Result<FinalResult, TransportError> {
        self.get_json(&format!("/jobs/{job}/result")).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::model::JobStatusKind;

    #[tokio::test]
    async fn fetch_status_decodes_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/bt-7/status"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status":"running","progress":55.0,"currentReturn":2.4}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = HttpStatusClient::new(server.uri()).unwrap();
        let status = client.fetch_status(&JobId::new("bt-7")).await.unwrap();

        assert_eq!(status.status, JobStatusKind::Running);
        assert_eq!(status.progress, Some(55.0));
    }

    #[tokio::test]
    async fn fetch_yield_points_passes_paging_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/bt-7/yield-points"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"date":"2024-01-03","cumulativeReturnPercent":1.5,"buyCount":1,"sellCount":0}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = HttpStatusClient::new(server.uri()).unwrap();
        let points = client
            .fetch_yield_points(&JobId::new("bt-7"), 2, 100)
            .await
            .unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].cumulative_return_percent, 1.5);
    }

    #[tokio::test]
    async fn non_success_status_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/bt-7/result"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such job"))
            .mount(&server)
            .await;

        let client = HttpStatusClient::new(server.uri()).unwrap();
        let err = client.fetch_result(&JobId::new("bt-7")).await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::Status { status: 404, ref body } if body == "no such job"
        ));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/bt-7/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("not json", "application/json"),
            )
            .mount(&server)
            .await;

        let client = HttpStatusClient::new(server.uri()).unwrap();
        let err = client.fetch_status(&JobId::new("bt-7")).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
