//! HTTP client for the dataset service.
//!
//! Three calls: trigger a job, read its progress, download its snapshot.
//! Every call is a single attempt; retry policy belongs to the caller.

use super::types::{CollectionRequest, ProgressReport, TriggerAck};
use crate::config::DatasetConfig;
use crate::error::HarvestError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Operation name for progress calls.
pub const STATUS_CHECK: &str = "status check";
/// Operation name for snapshot downloads.
pub const DATA_FETCH: &str = "data fetch";

/// The remote dataset service as seen by the job controller.
#[async_trait]
pub trait DatasetApi: Send + Sync {
    /// Submit the targets and return the job (snapshot) id.
    async fn trigger(&self, request: &CollectionRequest) -> Result<String, HarvestError>;
    /// Current `status` field of the job, `None` when the response has none.
    async fn progress(&self, job_id: &str) -> Result<Option<String>, HarvestError>;
    /// Records of a completed job.
    async fn snapshot(&self, job_id: &str) -> Result<Vec<Value>, HarvestError>;
}

/// reqwest-backed [`DatasetApi`].
#[derive(Clone)]
pub struct HttpDatasetClient {
    client: reqwest::Client,
    config: DatasetConfig,
    token: String,
}

impl HttpDatasetClient {
    pub fn new(config: DatasetConfig, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.snapshot_timeout())
            .user_agent(concat!("orgscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            config,
            token: token.into(),
        }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<T, HarvestError> {
        let resp = builder
            .bearer_auth(&self.token)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| HarvestError::Transport { operation, source })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HarvestError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|source| HarvestError::Transport { operation, source })?;

        serde_json::from_slice(&bytes).map_err(|e| HarvestError::Decode {
            operation,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl DatasetApi for HttpDatasetClient {
    async fn trigger(&self, request: &CollectionRequest) -> Result<String, HarvestError> {
        let operation = request.mode().trigger_operation();
        let mut query: Vec<(&str, &str)> = vec![("dataset_id", self.config.dataset_id.as_str())];
        query.extend_from_slice(request.mode().trigger_params());

        let builder = self
            .client
            .post(self.endpoint("trigger"))
            .query(&query)
            .json(request.targets());

        let ack: TriggerAck = self
            .send_json(operation, builder, self.config.request_timeout)
            .await?;

        ack.snapshot_id
            .filter(|id| !id.is_empty())
            .ok_or(HarvestError::MissingJobId)
    }

    async fn progress(&self, job_id: &str) -> Result<Option<String>, HarvestError> {
        let builder = self.client.get(self.endpoint(&format!("progress/{job_id}")));
        let report: ProgressReport = self
            .send_json(STATUS_CHECK, builder, self.config.request_timeout)
            .await?;
        Ok(report.status)
    }

    async fn snapshot(&self, job_id: &str) -> Result<Vec<Value>, HarvestError> {
        let builder = self
            .client
            .get(self.endpoint(&format!("snapshot/{job_id}")))
            .query(&[("format", "json")]);
        let body: Value = self
            .send_json(DATA_FETCH, builder, self.config.snapshot_timeout())
            .await?;

        match body {
            Value::Array(records) => Ok(records),
            other => Err(HarvestError::Decode {
                operation: DATA_FETCH,
                message: format!("expected a JSON array, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpDatasetClient::new(DatasetConfig::default(), "token");
        assert_eq!(client.config().dataset_id, crate::config::DEFAULT_DATASET_ID);
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = DatasetConfig {
            base_url: "http://localhost:1234/v3/".to_string(),
            ..DatasetConfig::default()
        };
        let client = HttpDatasetClient::new(config, "t");
        assert_eq!(
            client.endpoint("progress/s_1"),
            "http://localhost:1234/v3/progress/s_1"
        );
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&serde_json::json!({"status": "building"})), "an object");
    }
}
