//! hangar-core - Multi-agent coordination for aviation back-office requests
//!
//! This crate provides:
//! - Keyword classification of requests into HR, meeting and supply chain domains
//! - A generic domain agent executor with tool detection and response merging
//! - An orchestrator that fans out to domain agents and synthesizes one answer
//! - Completion providers with failover and a demo fallback
//! - Tool registries backed by in-memory domain stores

pub mod agents;
pub mod classifier;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod providers;
pub mod task;
pub mod tools;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use agents::{AgentDirectory, AgentInfo, DomainProfile};
pub use classifier::{DomainClassifier, KeywordClassifier};
pub use executor::{AgentError, AgentExecutor, DomainAgentExecutor};
pub use orchestrator::{BranchResult, BranchStatus, Orchestrator, OrchestratorConfig};
pub use planner::{KeywordToolPlanner, PlannedCall, ToolPlanner};
pub use providers::{CompletionProvider, ModelRouter, OpenAiCompatProvider};
pub use task::{TaskError, TaskEvent, TaskUpdater};
pub use tools::{ToolExecutor, ToolHandler, ToolOutcome, ToolRegistry};
pub use types::{AgentExecutionResult, Artifact, Domain, RequestContext, TaskState};
