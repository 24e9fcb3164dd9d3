use super::models::ExtractionRequest;
use crate::config::ExtractorSettings;
use crate::error::{extractor_error, Error, FlyerResult};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

/// An external service that turns a flyer request into raw text
#[async_trait]
pub trait Extractor: Send + Sync + 'static {
    /// Make exactly one call and return the response text verbatim
    async fn extract(&self, request: &ExtractionRequest) -> FlyerResult<String>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Extractor backed by an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    client: Client,
    endpoint: String,
}

impl OpenAiExtractor {
    pub fn new(settings: &ExtractorSettings) -> FlyerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: chat_completions_url(&settings.base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Extractor for OpenAiExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> FlyerResult<String> {
        info!(endpoint = %self.endpoint, model = %request.model, "Calling extractor");

        let res = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", request.credential))
            .header(header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            error!(%status, "Extractor returned an error status");
            return Err(Error::Extractor(format!("status {}: {}", status, body)));
        }

        let completion: ChatCompletionResponse = res.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| extractor_error("response contained no message content"))?;

        info!(chars = content.len(), "Received extractor response");
        Ok(content)
    }
}

/// `{base}/chat/completions`, tolerating a trailing slash on the base
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}
