//! Pioneer inference endpoint client.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::envelope::GenerationEnvelope;
use crate::adapters::http::{build_client, read_body, ApiError, OutboundPolicy};
use crate::domain::errors::DomainResult;
use crate::domain::models::{GenerationConfig, RetryConfig};
use crate::domain::ports::GenerationProvider;

const PROVIDER: &str = "pioneer";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    model_id: &'a str,
    task: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

/// Generation provider backed by the Pioneer inference API.
pub struct PioneerClient {
    http: reqwest::Client,
    base_url: String,
    model_id: String,
    api_key: String,
    policy: OutboundPolicy,
}

impl PioneerClient {
    /// Build a client. Fails when no API key is configured.
    pub fn new(config: &GenerationConfig, retry: RetryConfig, timeout: Duration) -> Result<Self, ApiError> {
        let api_key = config.api_key.clone().ok_or(ApiError::MissingApiKey)?;
        Ok(Self {
            http: build_client(timeout)?,
            base_url: config.base_url.clone(),
            model_id: config.model_id.clone(),
            api_key,
            policy: OutboundPolicy::new(config.requests_per_second, retry),
        })
    }

    async fn send(&self, request: &InferenceRequest<'_>) -> Result<String, ApiError> {
        let response = self
            .http
            .post(&self.base_url)
            .header("X-API-Key", &self.api_key)
            .json(request)
            .send()
            .await?;
        read_body(response).await
    }
}

#[async_trait]
impl GenerationProvider for PioneerClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, system_prompt, user_prompt), fields(model = %self.model_id))]
    async fn complete(&self, system_prompt: &str, user_prompt: &str, max_tokens: u32) -> DomainResult<String> {
        let request = InferenceRequest {
            model_id: &self.model_id,
            task: "generate",
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens,
        };

        let body = self
            .policy
            .run(|| self.send(&request))
            .await
            .map_err(|e| e.into_domain(PROVIDER))?;

        let envelope = GenerationEnvelope::parse(&body)
            .map_err(|e| ApiError::Decode(e.to_string()).into_domain(PROVIDER))?;
        let text = envelope.into_text();
        debug!(chars = text.len(), "generation complete");
        Ok(text)
    }
}
