//! Test doubles shared by unit tests

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::executor::{AgentError, AgentExecutor};
use crate::providers::CompletionProvider;
use crate::tools::{ToolHandler, ToolOutcome, json_schema};
use crate::types::{AgentExecutionResult, Artifact, RequestContext, TaskState};

/// Always answers with the same text and records every user message it sees
pub struct ScriptedProvider {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(
        &self,
        _system: &str,
        user_message: &str,
        _context: Option<&Map<String, Value>>,
    ) -> Result<String> {
        self.prompts.lock().unwrap().push(user_message.to_string());
        Ok(self.reply.clone())
    }
}

/// Always fails with the configured error text
pub struct FailingProvider {
    error: String,
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FailingProvider {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing-model"
    }

    async fn complete(
        &self,
        _system: &str,
        _user_message: &str,
        _context: Option<&Map<String, Value>>,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("{}", self.error))
    }
}

/// Sleeps for the configured delay, then fails like a timed-out upstream
pub struct StalledProvider {
    delay: Duration,
}

impl StalledProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CompletionProvider for StalledProvider {
    fn provider_name(&self) -> &str {
        "stalled"
    }

    fn model(&self) -> &str {
        "stalled-model"
    }

    async fn complete(
        &self,
        _system: &str,
        _user_message: &str,
        _context: Option<&Map<String, Value>>,
    ) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Err(anyhow!("upstream stalled for {:?}", self.delay))
    }
}

/// Tool whose handler always returns `Err`
pub struct ExplodingTool;

#[async_trait]
impl ToolHandler for ExplodingTool {
    fn name(&self) -> &str {
        "exploding"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn input_schema(&self) -> Value {
        json_schema(serde_json::json!({}), vec![])
    }

    async fn execute(&self, _input: Value) -> Result<ToolOutcome> {
        Err(anyhow!("backend unavailable"))
    }
}

/// How a [`MockAgent`] behaves when executed
pub enum MockBehavior {
    Reply(String),
    Fail(String),
    Sleep(Duration),
    Panic,
}

/// Agent executor with scripted behavior that records the task ids it receives
pub struct MockAgent {
    name: String,
    agent_type: String,
    behavior: MockBehavior,
    seen: Mutex<Vec<String>>,
}

impl MockAgent {
    pub fn new(agent_type: &str, behavior: MockBehavior) -> Self {
        Self {
            name: format!("Mock {} Agent", agent_type),
            agent_type: agent_type.to_string(),
            behavior,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(agent_type: &str, content: &str) -> Self {
        Self::new(agent_type, MockBehavior::Reply(content.to_string()))
    }

    pub fn seen_task_ids(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentExecutor for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn agent_type(&self) -> &str {
        &self.agent_type
    }

    async fn execute(&self, ctx: RequestContext) -> Result<AgentExecutionResult, AgentError> {
        self.seen.lock().unwrap().push(ctx.task_id.clone());
        match &self.behavior {
            MockBehavior::Reply(content) => Ok(AgentExecutionResult {
                task_id: ctx.task_id,
                agent_name: self.name.clone(),
                status: TaskState::Completed,
                artifacts: vec![Artifact {
                    content: content.clone(),
                    artifact_type: format!("{}_response", self.agent_type),
                    metadata: Map::new(),
                }],
                error: None,
            }),
            MockBehavior::Fail(message) => Err(AgentError::TaskFailed {
                agent: self.name.clone(),
                task_id: ctx.task_id,
                message: message.clone(),
            }),
            MockBehavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(AgentExecutionResult::failed(ctx.task_id, self.name.clone(), "slept"))
            }
            MockBehavior::Panic => panic!("mock agent panicked"),
        }
    }
}
