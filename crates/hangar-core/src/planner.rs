//! Tool detection: decides which domain tools a message should trigger
//!
//! A [`ToolPlanner`] is the seam where keyword detection could later be
//! replaced by structured argument extraction without touching the executor.

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::types::RequestContext;

/// One tool invocation chosen for a request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedCall {
    pub tool: String,
    pub input: Value,
}

/// Strategy for turning a request into tool calls
pub trait ToolPlanner: Send + Sync {
    fn plan(&self, ctx: &RequestContext) -> Vec<PlannedCall>;
}

/// Builds a tool's argument payload from the request
pub type ArgBuilder = fn(&RequestContext) -> Value;

/// Fires `tool` when any keyword occurs in the lower-cased message
pub struct ToolRule {
    tool: String,
    keywords: Vec<String>,
    build_args: ArgBuilder,
}

impl ToolRule {
    pub fn new(tool: &str, keywords: &[&str], build_args: ArgBuilder) -> Self {
        Self {
            tool: tool.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            build_args,
        }
    }

    fn matches(&self, message_lower: &str) -> bool {
        self.keywords.iter().any(|k| message_lower.contains(k.as_str()))
    }
}

/// Ordered keyword rules; several may fire for one message
pub struct KeywordToolPlanner {
    rules: Vec<ToolRule>,
}

impl KeywordToolPlanner {
    pub fn new(rules: Vec<ToolRule>) -> Self {
        Self { rules }
    }
}

impl ToolPlanner for KeywordToolPlanner {
    fn plan(&self, ctx: &RequestContext) -> Vec<PlannedCall> {
        let lower = ctx.user_message.to_lowercase();
        let calls: Vec<PlannedCall> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(&lower))
            .map(|rule| PlannedCall {
                tool: rule.tool.clone(),
                input: (rule.build_args)(ctx),
            })
            .collect();
        debug!(
            "Planned {} tool call(s) for task {}: {:?}",
            calls.len(),
            ctx.task_id,
            calls.iter().map(|c| c.tool.as_str()).collect::<Vec<_>>()
        );
        calls
    }
}

// ── Argument helpers ──

/// Current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First whitespace-delimited token starting with `prefix` (case-insensitive),
/// returned upper-cased with surrounding punctuation stripped
pub fn find_token(message: &str, prefix: &str) -> Option<String> {
    let prefix = prefix.to_uppercase();
    message
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_'))
        .map(str::to_uppercase)
        .find(|t| t.len() > prefix.len() && t.starts_with(&prefix))
}

/// A token from the message, or `prefix` + first 8 chars of the task id
pub fn token_or_fallback(ctx: &RequestContext, prefix: &str) -> String {
    find_token(&ctx.user_message, prefix).unwrap_or_else(|| {
        let short: String = ctx.task_id.chars().take(8).collect();
        format!("{}{}", prefix, short)
    })
}

/// First of `candidates` mentioned in the message (case-insensitive)
pub fn find_known<'a>(message: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let lower = message.to_lowercase();
    candidates
        .iter()
        .copied()
        .find(|c| lower.contains(&c.to_lowercase()))
}

/// First standalone positive integer in the message
pub fn find_quantity(message: &str) -> Option<u32> {
    message
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .filter_map(|t| t.parse::<u32>().ok())
        .find(|n| *n > 0)
}

/// `YYYY-MM-DD` for "today"/"tomorrow" if mentioned, otherwise today + `default_days`
pub fn relative_date(message: &str, default_days: i64) -> String {
    let lower = message.to_lowercase();
    let offset = if lower.contains("tomorrow") {
        1
    } else if lower.contains("today") {
        0
    } else {
        default_days
    };
    (today() + Duration::days(offset))
        .format("%Y-%m-%d")
        .to_string()
}
