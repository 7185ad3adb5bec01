use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{parse_response, GenerationBackend, GenerationRequest, GenerationResult};
use crate::error::GenerationError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Talks JSON over HTTP to the generation service
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "http client builder failed, falling back to defaults without timeout");
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        let url = format!("{}{}", self.base_url, request.kind().endpoint());
        debug!(%url, kind = request.kind().as_str(), "posting generation request");

        let response = self
            .client
            .post(&url)
            .json(request.parameters())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedPayload(e.to_string()))?;

        parse_response(request.kind(), body)
    }
}
