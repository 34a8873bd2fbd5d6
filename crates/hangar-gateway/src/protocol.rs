//! Gateway HTTP protocol: JSON bodies exchanged with clients

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hangar_core::types::TaskState;

fn default_tenant() -> String {
    "default".to_string()
}

fn default_user() -> String {
    "system".to_string()
}

fn default_agent_type() -> String {
    "orchestrator".to_string()
}

/// Client → Gateway chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_tenant")]
    pub tenant_id: String,
    #[serde(default = "default_user")]
    pub user_id: String,
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    /// Free-form client context, accepted but not interpreted
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// Gateway → Client chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub agent_name: String,
    pub task_id: String,
    /// Wall-clock seconds spent executing the request
    pub execution_time: f64,
    pub metadata: ChatMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMetadata {
    pub tenant_id: String,
    pub agent_type: String,
    pub status: TaskState,
    pub artifacts_count: usize,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
