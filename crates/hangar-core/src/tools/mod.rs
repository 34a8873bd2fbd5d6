//! Tool registry and the per-domain tool sets

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::types::title_case;

pub mod hr;
pub mod meeting;
pub mod supply_chain;

/// Structured result of a single tool call.
///
/// Expected domain failures (not found, invalid input) are `Error` values,
/// never `Err` from [`ToolHandler::execute`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success {
        message: String,
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    Error {
        message: String,
    },
}

impl ToolOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Attach a field to a success outcome; no-op on errors
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Self::Success { data, .. } = &mut self {
            data.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Error { message } => message,
        }
    }

    /// Look up an attached field
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Success { data, .. } => data.get(key),
            Self::Error { .. } => None,
        }
    }
}

impl From<StoreError> for ToolOutcome {
    fn from(e: StoreError) -> Self {
        Self::error(e.to_string())
    }
}

/// Expected failures raised by the domain stores
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{0}")]
    Invalid(String),
}

/// Description of a tool as exposed to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Trait for executing tools by name
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool_name: &str, input: Value) -> Result<ToolOutcome>;
    fn list_tools(&self) -> Vec<ToolDefinition>;
}

/// Individual tool handler
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;

    /// Human-readable name used in merged responses
    fn display_name(&self) -> String {
        title_case(self.name())
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome>;
}

/// Registry of available tools for one domain
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool handler, replacing any tool with the same name
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.name().to_string();
        debug!("Registering tool: {}", name);
        self.tools.insert(name, handler);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, tool_name: &str, input: Value) -> Result<ToolOutcome> {
        debug!("Executing tool: {} with input: {}", tool_name, input);

        let handler = self
            .tools
            .get(tool_name)
            .ok_or_else(|| anyhow!("Unknown tool: {}", tool_name))?;

        match handler.execute(input).await {
            Ok(outcome) => {
                if outcome.is_success() {
                    debug!("Tool {} succeeded", tool_name);
                } else {
                    debug!("Tool {} returned error: {}", tool_name, outcome.message());
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("Tool {} failed: {}", tool_name, e);
                Err(e)
            }
        }
    }

    fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|handler| ToolDefinition {
                name: handler.name().to_string(),
                description: handler.description().to_string(),
                input_schema: handler.input_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

/// Helper function to create a JSON schema for tool input
pub fn json_schema(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Deserialize a tool's typed input, turning bad input into an error outcome
pub(crate) fn parse_input<T: DeserializeOwned>(
    tool: &str,
    input: Value,
) -> std::result::Result<T, ToolOutcome> {
    serde_json::from_value(input)
        .map_err(|e| ToolOutcome::error(format!("Invalid input for {}: {}", tool, e)))
}

/// `PREFIX_` followed by 8 lowercase hex chars
pub(crate) fn generate_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..8])
}
