/// Text-generation provider boundary
///
/// The only network-facing piece of generation. `OpenAiProvider` talks to any
/// OpenAI-compatible chat-completions endpoint; tests plug in their own provider.

use crate::config::GenerationConfig;
use crate::generation::{error::GenerationError, request::PromptPair};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Sampling and size limits sent with every request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&GenerationConfig> for CompletionOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A chat-completions style backend that answers with one JSON object
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one request and return the reply content
    ///
    /// `Ok(None)` means the provider answered but produced no content.
    /// Transport failures must map to `GenerationUnavailable`.
    async fn complete(
        &self,
        prompts: &PromptPair,
        options: &CompletionOptions,
    ) -> Result<Option<String>, GenerationError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// OpenAI-compatible provider (OpenAI, Azure-style gateways, local servers)
#[derive(Debug)]
pub struct OpenAiProvider {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    /// Build a provider with a request timeout taken from config
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        if config.api_key.is_none() {
            tracing::warn!("⚠️ OPENAI_API_KEY is not set, generation requests will be unauthenticated");
        }

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_body(prompts: &PromptPair, options: &CompletionOptions) -> Value {
        json!({
            "model": options.model,
            "messages": [
                { "role": "system", "content": prompts.system },
                { "role": "user", "content": prompts.user }
            ],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
            "response_format": { "type": "json_object" }
        })
    }
}

/// Pull `choices[0].message.content` out of a chat-completions envelope
pub(crate) fn extract_content(envelope: &Value) -> Option<String> {
    envelope
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string)
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        prompts: &PromptPair,
        options: &CompletionOptions,
    ) -> Result<Option<String>, GenerationError> {
        let url = format!("{}/chat/completions", self.api_base);
        tracing::debug!("🌍 Generation request: POST {} (model: {})", url, options.model);

        let mut request = self
            .client
            .post(&url)
            .json(&Self::request_body(prompts, options));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 Provider response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::GenerationUnavailable(format!(
                "provider returned {}: {}",
                status, error_text
            )));
        }

        let envelope: Value = response.json().await.map_err(|e| {
            GenerationError::GenerationUnavailable(format!("unreadable provider response: {}", e))
        })?;

        if let Some(usage) = envelope.get("usage") {
            tracing::debug!("📊 Token usage: {}", usage);
        }

        Ok(extract_content(&envelope))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
