//! OpenAI-compatible completion provider (OpenAI, Ollama, LiteLLM proxies, etc.)
//!
//! Speaks the `/chat/completions` wire format against a configurable base URL.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use super::types::CompletionProvider;

/// Provider for any endpoint exposing the OpenAI chat completions API
pub struct OpenAiCompatProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiCompatProvider {
    /// Create a new provider.
    ///
    /// - `name`: human-readable label (e.g. "openai", "ollama")
    /// - `base_url`: the endpoint root including the version segment
    ///   (e.g. `https://api.openai.com/v1`, `http://localhost:11434/v1`)
    pub fn new(name: String, api_key: String, model: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            name,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_tokens: 2000,
            temperature: 0.1,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_messages(
        system: &str,
        user_message: &str,
        context: Option<&Map<String, Value>>,
    ) -> Vec<WireMessage> {
        let mut messages = vec![WireMessage {
            role: "system".to_string(),
            content: system.to_string(),
        }];
        if let Some(ctx) = context.filter(|c| !c.is_empty()) {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: format!("Context: {}", Value::Object(ctx.clone())),
            });
        }
        messages.push(WireMessage {
            role: "user".to_string(),
            content: user_message.to_string(),
        });
        messages
    }

    fn extract_text(resp: WireResponse) -> Result<String> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Completion response had no choices"))?;
        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(anyhow!("Completion response had empty content")),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        context: Option<&Map<String, Value>>,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let messages = Self::build_messages(system, user_message, context);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": messages,
        });

        debug!(
            "{} request: model={}, messages={}",
            self.name,
            self.model,
            messages.len()
        );

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", self.name))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "{} request failed with status {}: {}",
                self.name,
                status,
                error_text
            ));
        }

        let wire: WireResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", self.name))?;

        Self::extract_text(wire)
    }
}

// ── Wire types ──

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
}
