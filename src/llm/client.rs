use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::llm::{
    CompletionClient,
    errors::LlmError,
    types::{ApiErrorBody, ChatRequest, ChatResponseRaw, Message},
};

/// Chat-completions client for the OpenAI API or any compatible server.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
        })
    }

    /// Point at a proxy, Azure deployment or local server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let start = Instant::now();
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "completion request failed");
                LlmError::from_reqwest_error(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            warn!(status = %status, error = %message, "completion api error");
            return Err(LlmError::Api { status, message });
        }

        let raw: ChatResponseRaw = response.json().await.map_err(LlmError::from_reqwest_error)?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            reply_chars = content.len(),
            "completion finished"
        );

        Ok(content)
    }
}
