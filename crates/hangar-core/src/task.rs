//! Task lifecycle tracking
//!
//! A [`TaskUpdater`] owns one task from PENDING through a single WORKING
//! phase to exactly one terminal state, collecting artifacts on the way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::{AgentExecutionResult, Artifact, TaskState};

/// Illegal lifecycle operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task {task_id} is already {state}")]
    AlreadyTerminal { task_id: String, state: TaskState },
    #[error("task {task_id} cannot complete without an artifact")]
    NoArtifact { task_id: String },
}

/// A single recorded transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task_id: String,
    pub state: TaskState,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    pub timestamp: DateTime<Utc>,
}

/// Drives one task through its lifecycle
#[derive(Debug)]
pub struct TaskUpdater {
    task_id: String,
    agent_name: String,
    state: TaskState,
    progress: Option<f32>,
    artifacts: Vec<Artifact>,
    error: Option<String>,
    history: Vec<TaskEvent>,
    events: Option<mpsc::UnboundedSender<TaskEvent>>,
}

impl TaskUpdater {
    pub fn new(task_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            agent_name: agent_name.into(),
            state: TaskState::Pending,
            progress: None,
            artifacts: Vec::new(),
            error: None,
            history: Vec::new(),
            events: None,
        }
    }

    /// Forward every transition to a progress channel
    pub fn with_events(mut self, events: mpsc::UnboundedSender<TaskEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn progress(&self) -> Option<f32> {
        self.progress
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn history(&self) -> &[TaskEvent] {
        &self.history
    }

    fn ensure_open(&self) -> Result<(), TaskError> {
        if self.state.is_terminal() {
            return Err(TaskError::AlreadyTerminal {
                task_id: self.task_id.clone(),
                state: self.state,
            });
        }
        Ok(())
    }

    fn record(&mut self, message: &str) {
        let event = TaskEvent {
            task_id: self.task_id.clone(),
            state: self.state,
            message: message.to_string(),
            progress: self.progress,
            timestamp: Utc::now(),
        };
        debug!(
            "Task {} ({}) -> {} {:?}: {}",
            self.task_id, self.agent_name, self.state, self.progress, message
        );
        if let Some(tx) = &self.events {
            if tx.send(event.clone()).is_err() {
                debug!("Progress receiver dropped for task {}", self.task_id);
            }
        }
        self.history.push(event);
    }

    /// Enter or stay in WORKING with a status message and optional progress
    pub fn update_status(&mut self, message: &str, progress: Option<f32>) -> Result<(), TaskError> {
        self.ensure_open()?;
        self.state = TaskState::Working;
        if let Some(p) = progress {
            self.progress = Some(p.clamp(0.0, 100.0));
        }
        self.record(message);
        Ok(())
    }

    /// Append an artifact; the list is append-only
    pub fn add_artifact(
        &mut self,
        content: impl Into<String>,
        artifact_type: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Result<&Artifact, TaskError> {
        self.ensure_open()?;
        self.artifacts.push(Artifact {
            content: content.into(),
            artifact_type: artifact_type.into(),
            metadata,
        });
        let idx = self.artifacts.len() - 1;
        Ok(&self.artifacts[idx])
    }

    /// Transition to COMPLETED; requires at least one artifact
    pub fn complete(&mut self) -> Result<(), TaskError> {
        self.ensure_open()?;
        if self.artifacts.is_empty() {
            return Err(TaskError::NoArtifact {
                task_id: self.task_id.clone(),
            });
        }
        self.state = TaskState::Completed;
        self.progress = Some(100.0);
        self.record("Task completed");
        Ok(())
    }

    /// Transition to FAILED with an error message
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TaskError> {
        self.ensure_open()?;
        let error = error.into();
        warn!("Task {} ({}) failed: {}", self.task_id, self.agent_name, error);
        self.state = TaskState::Failed;
        self.error = Some(error.clone());
        self.record(&error);
        Ok(())
    }

    pub fn into_result(self) -> AgentExecutionResult {
        AgentExecutionResult {
            task_id: self.task_id,
            agent_name: self.agent_name,
            status: self.state,
            artifacts: self.artifacts,
            error: self.error,
        }
    }
}
