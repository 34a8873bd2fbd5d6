//! Shared types for hangar-core

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A vertical slice of business capability with its own tools and keyword set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Hr,
    Meeting,
    SupplyChain,
}

impl Domain {
    /// All domains in routing order
    pub const ALL: [Domain; 3] = [Domain::Hr, Domain::Meeting, Domain::SupplyChain];

    /// Routing tag (`hr`, `meeting`, `supply_chain`)
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Hr => "hr",
            Self::Meeting => "meeting",
            Self::SupplyChain => "supply_chain",
        }
    }

    /// Human-readable label used in synthesized responses ("Hr", "Supply Chain")
    pub fn label(&self) -> String {
        title_case(self.tag())
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hr" => Ok(Self::Hr),
            "meeting" => Ok(Self::Meeting),
            "supply_chain" => Ok(Self::SupplyChain),
            other => Err(format!("unknown domain '{}'", other)),
        }
    }
}

/// Per-invocation request record threaded through every call.
///
/// Never mutated after creation; sub-agent invocations get a copy with a
/// derived task id via [`RequestContext::derive_for`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestContext {
    pub task_id: String,
    pub context_id: String,
    pub user_message: String,
    pub tenant_id: String,
    pub user_id: String,
}

impl RequestContext {
    /// Create a context with fresh task and context ids
    pub fn new(
        user_message: impl Into<String>,
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            context_id: Uuid::new_v4().to_string(),
            user_message: user_message.into(),
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Copy of this context whose task id is `{task_id}_{suffix}`
    pub fn derive_for(&self, suffix: &str) -> Self {
        Self {
            task_id: format!("{}_{}", self.task_id, suffix),
            ..self.clone()
        }
    }
}

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Working,
    Completed,
    Failed,
}

impl TaskState {
    /// Whether no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Working => write!(f, "working"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Final textual output of one task execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub content: String,
    pub artifact_type: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Result shape returned by every executor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentExecutionResult {
    pub task_id: String,
    pub agent_name: String,
    pub status: TaskState,
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentExecutionResult {
    /// A FAILED result with no artifacts
    pub fn failed(
        task_id: impl Into<String>,
        agent_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            agent_name: agent_name.into(),
            status: TaskState::Failed,
            artifacts: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Content of the first artifact, if any
    pub fn primary_content(&self) -> Option<&str> {
        self.artifacts.first().map(|a| a.content.as_str())
    }
}

/// `schedule_training` → `Schedule Training`
pub fn title_case(s: &str) -> String {
    s.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
