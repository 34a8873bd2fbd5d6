//! Provider trait and demo-mode fallback

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::warn;

/// Marker present in every demo-mode response
pub const DEMO_MODE_MARKER: &str = "[DEMO MODE";

/// A text-completion capability
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model(&self) -> &str;

    /// Complete `user_message` under `system`, with optional structured context
    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        context: Option<&Map<String, Value>>,
    ) -> Result<String>;
}

/// Deterministic stand-in text used when no model answer is available.
///
/// `reason` is `None` when no provider is configured at all.
pub fn demo_response(
    agent_name: &str,
    specialty: &str,
    tool_count: usize,
    message: &str,
    reason: Option<&str>,
) -> String {
    let tag = match reason {
        Some(_) => "[DEMO MODE - LLM Unavailable]",
        None => "[DEMO MODE]",
    };
    format!(
        "{} {} received: {}\n\nThis agent specializes in {} operations with {} available tools.",
        tag, agent_name, message, specialty, tool_count
    )
}

/// Ask the provider, substituting the demo response on any failure.
///
/// With a `budget`, a completion that has not answered in time counts as a
/// failure too.
pub async fn complete_or_demo(
    provider: Option<&dyn CompletionProvider>,
    system: &str,
    message: &str,
    agent_name: &str,
    specialty: &str,
    tool_count: usize,
    budget: Option<Duration>,
) -> String {
    let Some(provider) = provider else {
        return demo_response(agent_name, specialty, tool_count, message, None);
    };
    let completion = provider.complete(system, message, None);
    let outcome = match budget {
        Some(budget) => match tokio::time::timeout(budget, completion).await {
            Ok(outcome) => outcome,
            Err(_) => Err(anyhow!("completion timed out after {}ms", budget.as_millis())),
        },
        None => completion.await,
    };
    match outcome {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "Completion via {} failed for {}, falling back to demo mode: {}",
                provider.provider_name(),
                agent_name,
                e
            );
            demo_response(agent_name, specialty, tool_count, message, Some(&e.to_string()))
        }
    }
}
