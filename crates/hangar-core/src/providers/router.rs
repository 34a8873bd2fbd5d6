//! Model router with automatic failover across completion providers

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::types::CompletionProvider;

/// Routes completion requests across multiple providers with automatic failover
pub struct ModelRouter {
    /// Providers in failover order (index 0 = primary)
    providers: Vec<Arc<dyn CompletionProvider>>,
    /// Maximum attempts per provider before moving to the next
    max_retries_per_provider: u32,
    /// Base delay for exponential backoff
    base_retry_delay: Duration,
}

impl ModelRouter {
    /// Create a router with a single provider (no failover)
    pub fn single(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            providers: vec![provider],
            max_retries_per_provider: 1,
            base_retry_delay: Duration::from_millis(500),
        }
    }

    /// Create a router with multiple providers in failover order
    pub fn with_failover(providers: Vec<Arc<dyn CompletionProvider>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(anyhow!("ModelRouter requires at least one provider"));
        }
        Ok(Self {
            providers,
            max_retries_per_provider: 2,
            base_retry_delay: Duration::from_millis(500),
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries_per_provider = max_retries.max(1);
        self
    }

    pub fn with_base_retry_delay(mut self, delay: Duration) -> Self {
        self.base_retry_delay = delay;
        self
    }

    /// Number of configured providers
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

#[async_trait]
impl CompletionProvider for ModelRouter {
    fn provider_name(&self) -> &str {
        self.providers
            .first()
            .map(|p| p.provider_name())
            .unwrap_or("unknown")
    }

    fn model(&self) -> &str {
        self.providers
            .first()
            .map(|p| p.model())
            .unwrap_or("unknown")
    }

    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        context: Option<&Map<String, Value>>,
    ) -> Result<String> {
        let mut last_error = None;

        for (idx, provider) in self.providers.iter().enumerate() {
            for attempt in 0..self.max_retries_per_provider {
                debug!(
                    "Trying provider {} ({}) {}/{} attempt {}/{}",
                    provider.provider_name(),
                    provider.model(),
                    idx + 1,
                    self.providers.len(),
                    attempt + 1,
                    self.max_retries_per_provider,
                );

                match provider.complete(system, user_message, context).await {
                    Ok(text) => {
                        if idx > 0 {
                            info!(
                                "Request succeeded on failover provider {} ({})",
                                provider.provider_name(),
                                provider.model()
                            );
                        }
                        return Ok(text);
                    }
                    Err(e) => {
                        let err_str = e.to_string();
                        let retryable = is_retryable_error(&err_str);
                        warn!(
                            "Provider {} ({}) failed (attempt {}, retryable={}): {}",
                            provider.provider_name(),
                            provider.model(),
                            attempt + 1,
                            retryable,
                            err_str,
                        );
                        last_error = Some(e);

                        if !retryable {
                            break;
                        }
                        if attempt + 1 < self.max_retries_per_provider {
                            let delay = self.base_retry_delay * 2u32.pow(attempt);
                            debug!("Backing off for {:?} before retry", delay);
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }

            if let Some(next) = self.providers.get(idx + 1) {
                info!(
                    "Failing over from {} to {}",
                    provider.provider_name(),
                    next.provider_name()
                );
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("All providers failed")))
    }
}

/// Rate limits, server errors and timeouts are worth retrying
fn is_retryable_error(err: &str) -> bool {
    let retryable_patterns = [
        "429",
        "500",
        "502",
        "503",
        "504",
        "rate limit",
        "rate_limit",
        "overloaded",
        "timeout",
        "timed out",
        "connection reset",
        "connection refused",
        "temporarily unavailable",
    ];
    let lower = err.to_lowercase();
    retryable_patterns.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingProvider, ScriptedProvider};

    #[tokio::test]
    async fn test_single_provider_success() {
        let router = ModelRouter::single(Arc::new(ScriptedProvider::new("primary answer")));
        let text = router.complete("sys", "hi", None).await.unwrap();
        assert_eq!(text, "primary answer");
    }

    #[tokio::test]
    async fn test_failover_to_second_provider() {
        let router = ModelRouter::with_failover(vec![
            Arc::new(FailingProvider::new("status 500: server error")),
            Arc::new(ScriptedProvider::new("from fallback")),
        ])
        .unwrap()
        .with_max_retries(1)
        .with_base_retry_delay(Duration::from_millis(1));

        let text = router.complete("sys", "hi", None).await.unwrap();
        assert_eq!(text, "from fallback");
    }

    #[tokio::test]
    async fn test_retries_retryable_errors() {
        let flaky = Arc::new(FailingProvider::new("status 503: overloaded"));
        let router = ModelRouter::with_failover(vec![
            flaky.clone(),
            Arc::new(ScriptedProvider::new("ok")),
        ])
        .unwrap()
        .with_max_retries(3)
        .with_base_retry_delay(Duration::from_millis(1));

        router.complete("sys", "hi", None).await.unwrap();
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_skips_retries() {
        let primary = Arc::new(FailingProvider::new("status 401: unauthorized"));
        let router = ModelRouter::with_failover(vec![
            primary.clone(),
            Arc::new(ScriptedProvider::new("from fallback")),
        ])
        .unwrap()
        .with_max_retries(3)
        .with_base_retry_delay(Duration::from_millis(1));

        let text = router.complete("sys", "hi", None).await.unwrap();
        assert_eq!(text, "from fallback");
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let router = ModelRouter::with_failover(vec![
            Arc::new(FailingProvider::new("auth error 401")),
            Arc::new(FailingProvider::new("auth error 401")),
        ])
        .unwrap()
        .with_max_retries(1);

        let result = router.complete("sys", "hi", None).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_providers_rejected() {
        assert!(ModelRouter::with_failover(vec![]).is_err());
    }

    #[test]
    fn test_model_and_name() {
        let router = ModelRouter::single(Arc::new(ScriptedProvider::new("x")));
        assert_eq!(router.model(), "scripted-model");
        assert_eq!(router.provider_name(), "scripted");
        assert_eq!(router.provider_count(), 1);
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error("status 429: rate limit exceeded"));
        assert!(is_retryable_error("status 500: internal server error"));
        assert!(is_retryable_error("request timed out"));
        assert!(is_retryable_error("API overloaded"));
        assert!(!is_retryable_error("status 401: unauthorized"));
        assert!(!is_retryable_error("invalid API key"));
    }
}
