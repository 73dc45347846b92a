use crate::domain::ports::{ConfigProvider, PredictionClient};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// POSTs each batch as a JSON array to the prediction endpoint.
pub struct HttpPredictionClient {
    client: Client,
    endpoint: String,
}

impl HttpPredictionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(config.api_endpoint(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, batch: &serde_json::Value) -> Result<serde_json::Value> {
        let body = serde_json::to_vec(batch)?;
        tracing::debug!("📡 POST {} ({} bytes)", self.endpoint, body.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::ApiStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| EtlError::UnexpectedResponseError {
            message: format!("body is not valid JSON ({}): {}", e, String::from_utf8_lossy(&bytes)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_predict_posts_json_array() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/predictions/")
                .header("content-type", "application/json")
                .json_body(json!([{"CustomerID": "1"}]));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"results": []}));
        });

        let client = HttpPredictionClient::new(server.url("/api/predictions/"), None).unwrap();
        let response = client.predict(&json!([{"CustomerID": "1"}])).await.unwrap();

        api_mock.assert();
        assert_eq!(response, json!({"results": []}));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/predict");
            then.status(503).body("model warming up");
        });

        let client = HttpPredictionClient::new(server.url("/predict"), None).unwrap();
        let err = client.predict(&json!([])).await.unwrap_err();

        match err {
            EtlError::ApiStatusError { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model warming up");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/predict");
            then.status(200).body("<html>oops</html>");
        });

        let client = HttpPredictionClient::new(server.url("/predict"), None).unwrap();
        let err = client.predict(&json!([])).await.unwrap_err();
        match err {
            EtlError::UnexpectedResponseError { message } => assert!(message.contains("<html>oops</html>")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
