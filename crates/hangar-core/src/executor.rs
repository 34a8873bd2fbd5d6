//! Domain agent execution
//!
//! One generic executor serves every domain. It is parameterized by a
//! [`DomainProfile`], a tool registry and a [`ToolPlanner`], and runs:
//! completion (with demo fallback) → planned tool calls → merged response
//! → one artifact → COMPLETED.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::agents::DomainProfile;
use crate::planner::ToolPlanner;
use crate::providers::{CompletionProvider, complete_or_demo};
use crate::task::{TaskError, TaskEvent, TaskUpdater};
use crate::tools::{ToolExecutor, ToolOutcome, ToolRegistry};
use crate::types::{AgentExecutionResult, RequestContext};

/// Failures that escape an executor
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The task was marked FAILED before this error was returned
    #[error("{agent} task {task_id} failed: {message}")]
    TaskFailed {
        agent: String,
        task_id: String,
        message: String,
    },
    #[error(transparent)]
    Lifecycle(#[from] TaskError),
}

impl AgentError {
    /// The FAILED result equivalent to this error
    pub fn into_failed_result(
        self,
        ctx: &RequestContext,
        agent_name: &str,
    ) -> AgentExecutionResult {
        match self {
            Self::TaskFailed {
                agent,
                task_id,
                message,
            } => AgentExecutionResult::failed(task_id, agent, message),
            other => {
                AgentExecutionResult::failed(ctx.task_id.clone(), agent_name, other.to_string())
            }
        }
    }
}

/// Anything that can handle a request end to end
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Display name, e.g. "Aviation HR Agent"
    fn name(&self) -> &str;

    /// Routing tag, e.g. "hr" or "orchestrator"
    fn agent_type(&self) -> &str;

    async fn execute(&self, ctx: RequestContext) -> Result<AgentExecutionResult, AgentError>;
}

/// One tool call as performed for a single request
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRecord {
    /// Tool name, or `"error"` when the call itself failed
    pub tool_name: String,
    pub display_name: String,
    pub result: Result<ToolOutcome, String>,
}

impl ToolInvocationRecord {
    fn failed(message: String) -> Self {
        Self {
            tool_name: "error".to_string(),
            display_name: "Error".to_string(),
            result: Err(message),
        }
    }
}

/// Generic executor for a single domain
pub struct DomainAgentExecutor {
    profile: DomainProfile,
    tools: Arc<ToolRegistry>,
    planner: Box<dyn ToolPlanner>,
    provider: Option<Arc<dyn CompletionProvider>>,
    completion_budget: Option<Duration>,
    progress: Option<mpsc::UnboundedSender<TaskEvent>>,
}

impl DomainAgentExecutor {
    pub fn new(
        profile: DomainProfile,
        tools: Arc<ToolRegistry>,
        planner: Box<dyn ToolPlanner>,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        Self {
            profile,
            tools,
            planner,
            provider,
            completion_budget: None,
            progress: None,
        }
    }

    /// Give up on the model after `budget` and answer with demo text
    pub fn with_completion_budget(mut self, budget: Duration) -> Self {
        self.completion_budget = Some(budget);
        self
    }

    /// Forward task transitions to a progress channel
    pub fn with_progress(mut self, progress: mpsc::UnboundedSender<TaskEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn profile(&self) -> &DomainProfile {
        &self.profile
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    async fn invoke_tools(&self, ctx: &RequestContext) -> Vec<ToolInvocationRecord> {
        let mut records = Vec::new();
        for call in self.planner.plan(ctx) {
            let display_name = self
                .tools
                .get(&call.tool)
                .map(|t| t.display_name())
                .unwrap_or_default();
            match self.tools.execute(&call.tool, call.input).await {
                Ok(outcome) => records.push(ToolInvocationRecord {
                    tool_name: call.tool,
                    display_name,
                    result: Ok(outcome),
                }),
                Err(e) => {
                    warn!("{}: tool {} failed: {}", self.profile.agent_name, call.tool, e);
                    records.push(ToolInvocationRecord::failed(format!(
                        "Tool execution failed: {}",
                        e
                    )));
                }
            }
        }
        records
    }

    async fn run(&self, ctx: &RequestContext, task: &mut TaskUpdater) -> Result<(), AgentError> {
        task.update_status(
            &format!("Analyzing {} request", self.profile.specialty),
            Some(25.0),
        )?;

        let completion = complete_or_demo(
            self.provider.as_deref(),
            &self.profile.system_prompt,
            &ctx.user_message,
            &self.profile.agent_name,
            &self.profile.specialty,
            self.tools.len(),
            self.completion_budget,
        )
        .await;

        let records = self.invoke_tools(ctx).await;

        task.update_status(
            &format!("Processing {} data", self.profile.specialty),
            Some(75.0),
        )?;

        let content = merge_response(&completion, &self.profile.actions_heading, &records);

        let mut metadata = Map::new();
        metadata.insert("agent_type".into(), json!(self.profile.domain.tag()));
        metadata.insert("tools_used".into(), json!(!records.is_empty()));
        metadata.insert(
            "tools_invoked".into(),
            json!(records.iter().map(|r| r.tool_name.as_str()).collect::<Vec<_>>()),
        );
        metadata.insert("tenant_id".into(), json!(ctx.tenant_id));
        metadata.insert("task_id".into(), json!(ctx.task_id));

        task.add_artifact(content, self.profile.artifact_type.clone(), metadata)?;
        task.complete()?;
        Ok(())
    }
}

#[async_trait]
impl AgentExecutor for DomainAgentExecutor {
    fn name(&self) -> &str {
        &self.profile.agent_name
    }

    fn agent_type(&self) -> &str {
        self.profile.domain.tag()
    }

    async fn execute(&self, ctx: RequestContext) -> Result<AgentExecutionResult, AgentError> {
        info!("{} handling task {}", self.profile.agent_name, ctx.task_id);
        let mut task = TaskUpdater::new(ctx.task_id.clone(), self.profile.agent_name.clone());
        if let Some(tx) = &self.progress {
            task = task.with_events(tx.clone());
        }

        match self.run(&ctx, &mut task).await {
            Ok(()) => {
                debug!("{} completed task {}", self.profile.agent_name, ctx.task_id);
                Ok(task.into_result())
            }
            Err(e) => {
                let message = format!("{} task failed: {}", self.profile.specialty, e);
                error!("{} execution failed: {}", self.profile.agent_name, message);
                if let Err(fail_err) = task.fail(message.clone()) {
                    warn!("Could not mark task {} failed: {}", ctx.task_id, fail_err);
                }
                Err(AgentError::TaskFailed {
                    agent: self.profile.agent_name.clone(),
                    task_id: ctx.task_id,
                    message,
                })
            }
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Completion text verbatim when no tools ran, otherwise the completion
/// followed by an actions section listing each tool result
pub fn merge_response(completion: &str, heading: &str, records: &[ToolInvocationRecord]) -> String {
    if records.is_empty() {
        return completion.to_string();
    }

    let mut out = format!("{}\n\n## {}:\n\n", completion, heading);
    for record in records {
        match &record.result {
            Ok(ToolOutcome::Success { message, data }) => {
                out.push_str(&format!("✅ **{}:**\n", record.display_name));
                out.push_str(&format!("   - message: {}\n", message));
                for (key, value) in data {
                    out.push_str(&format!("   - {}: {}\n", key, render_value(value)));
                }
                out.push('\n');
            }
            Ok(ToolOutcome::Error { message }) => {
                out.push_str(&format!("❌ **{}:** {}\n\n", record.display_name, message));
            }
            Err(message) => {
                out.push_str(&format!("❌ **Error:** {}\n\n", message));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{KeywordToolPlanner, ToolRule};
    use crate::providers::DEMO_MODE_MARKER;
    use crate::testing::{ExplodingTool, FailingProvider, ScriptedProvider, StalledProvider};
    use crate::tools::{hr, meeting, supply_chain};
    use crate::types::{Domain, TaskState};

    fn hr_executor(provider: Option<Arc<dyn CompletionProvider>>) -> DomainAgentExecutor {
        let store = Arc::new(hr::HrStore::new());
        DomainAgentExecutor::new(
            DomainProfile::hr(),
            Arc::new(hr::registry(store)),
            Box::new(hr::planner()),
            provider,
        )
    }

    fn supply_executor() -> DomainAgentExecutor {
        let store = Arc::new(supply_chain::SupplyChainStore::new());
        DomainAgentExecutor::new(
            DomainProfile::supply_chain(),
            Arc::new(supply_chain::registry(store)),
            Box::new(supply_chain::planner()),
            None,
        )
    }

    #[tokio::test]
    async fn test_training_request_fires_training_tool() {
        let exec = hr_executor(Some(Arc::new(ScriptedProvider::new("Happy to help."))));
        let ctx = RequestContext::new(
            "I need to schedule a training session for employee EMP_001",
            "acme",
            "alice",
        );
        let result = exec.execute(ctx.clone()).await.unwrap();
        assert_eq!(result.status, TaskState::Completed);
        assert_eq!(result.artifacts.len(), 1);

        let artifact = &result.artifacts[0];
        assert_eq!(artifact.artifact_type, "hr_response");
        assert!(artifact.content.starts_with("Happy to help.\n\n## HR System Actions Performed:"));
        assert!(artifact.content.contains("✅ **Schedule Training:**"));

        let line = artifact
            .content
            .lines()
            .find(|l| l.trim_start().starts_with("- training_id: "))
            .unwrap();
        let id = line.trim_start().trim_start_matches("- training_id: ");
        assert!(id.starts_with("TRN_"));
        assert_eq!(id.len(), 12);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));

        assert_eq!(artifact.metadata["agent_type"], "hr");
        assert_eq!(artifact.metadata["tools_used"], true);
        assert_eq!(artifact.metadata["tenant_id"], "acme");
        assert_eq!(artifact.metadata["task_id"], json!(ctx.task_id));
    }

    #[tokio::test]
    async fn test_no_tools_returns_completion_verbatim() {
        let exec = hr_executor(Some(Arc::new(ScriptedProvider::new("Staffing looks fine."))));
        let ctx = RequestContext::new("how is our personnel doing", "t", "u");
        let result = exec.execute(ctx).await.unwrap();
        assert_eq!(result.primary_content(), Some("Staffing looks fine."));
        assert_eq!(result.artifacts[0].metadata["tools_used"], false);
    }

    #[tokio::test]
    async fn test_failing_provider_still_completes() {
        let exec = hr_executor(Some(Arc::new(FailingProvider::new("connection refused"))));
        let ctx = RequestContext::new("generate an hr report", "t", "u");
        let result = exec.execute(ctx).await.unwrap();
        assert_eq!(result.status, TaskState::Completed);
        let content = result.primary_content().unwrap();
        assert!(content.contains(DEMO_MODE_MARKER));
        assert!(content.contains("Generate Hr Report"));
    }

    fn domain_executor(
        domain: Domain,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> DomainAgentExecutor {
        let (registry, planner) = match domain {
            Domain::Hr => (hr::registry(Arc::new(hr::HrStore::new())), hr::planner()),
            Domain::Meeting => (
                meeting::registry(Arc::new(meeting::MeetingStore::new())),
                meeting::planner(),
            ),
            Domain::SupplyChain => (
                supply_chain::registry(Arc::new(supply_chain::SupplyChainStore::new())),
                supply_chain::planner(),
            ),
        };
        DomainAgentExecutor::new(
            DomainProfile::for_domain(domain),
            Arc::new(registry),
            Box::new(planner),
            provider,
        )
    }

    #[tokio::test]
    async fn test_every_domain_completes_when_provider_fails() {
        for domain in Domain::ALL {
            let exec = domain_executor(domain, Some(Arc::new(FailingProvider::new("status 500"))));
            let result = exec
                .execute(RequestContext::new("send me a report", "t", "u"))
                .await
                .unwrap();
            assert_eq!(result.status, TaskState::Completed, "{}", domain);
            let content = result.primary_content().unwrap();
            assert!(content.starts_with("[DEMO MODE - LLM Unavailable]"), "{}", domain);
            assert!(content.contains("✅ **Generate "), "{}", domain);
            assert_eq!(result.artifacts[0].metadata["tools_used"], true);
        }
    }

    #[tokio::test]
    async fn test_stalled_provider_keeps_tool_output() {
        let exec = hr_executor(Some(Arc::new(StalledProvider::new(Duration::from_secs(5)))))
            .with_completion_budget(Duration::from_millis(200));
        let ctx = RequestContext::new(
            "I need to schedule a training session for employee EMP_001",
            "t",
            "u",
        );
        let started = std::time::Instant::now();
        let result = exec.execute(ctx).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(result.status, TaskState::Completed);
        let content = result.primary_content().unwrap();
        assert!(content.starts_with("[DEMO MODE - LLM Unavailable] Aviation HR Agent received:"));
        assert!(content.contains("   - training_id: TRN_"));
    }

    #[tokio::test]
    async fn test_same_message_same_content() {
        let exec = supply_executor();
        let first = RequestContext::new("check stock inventory levels", "t", "u");
        let mut second = first.clone();
        second.task_id = format!("{}-again", first.task_id);

        let a = exec.execute(first).await.unwrap();
        let b = exec.execute(second).await.unwrap();
        assert_eq!(a.primary_content(), b.primary_content());
        assert_ne!(a.task_id, b.task_id);
    }

    #[tokio::test]
    async fn test_tool_error_recorded_and_others_continue() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ExplodingTool));
        let planner = KeywordToolPlanner::new(vec![
            ToolRule::new("exploding", &["stock"], |_| json!({})),
            ToolRule::new("missing_tool", &["stock"], |_| json!({})),
        ]);
        let exec = DomainAgentExecutor::new(
            DomainProfile::supply_chain(),
            Arc::new(registry),
            Box::new(planner),
            None,
        );
        let result = exec
            .execute(RequestContext::new("stock check", "t", "u"))
            .await
            .unwrap();
        assert_eq!(result.status, TaskState::Completed);
        let content = result.primary_content().unwrap();
        assert_eq!(content.matches("❌ **Error:** Tool execution failed").count(), 2);
        assert_eq!(
            result.artifacts[0].metadata["tools_invoked"],
            json!(["error", "error"])
        );
    }

    #[tokio::test]
    async fn test_progress_checkpoints() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let exec = supply_executor().with_progress(tx);
        exec.execute(RequestContext::new("supplier status", "t", "u"))
            .await
            .unwrap();
        drop(exec);

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            seen.push((event.state, event.progress));
        }
        assert_eq!(
            seen,
            vec![
                (TaskState::Working, Some(25.0)),
                (TaskState::Working, Some(75.0)),
                (TaskState::Completed, Some(100.0)),
            ]
        );
    }

    #[test]
    fn test_merge_response_rendering() {
        let records = vec![
            ToolInvocationRecord {
                tool_name: "cancel_booking".into(),
                display_name: "Cancel Booking".into(),
                result: Ok(ToolOutcome::error("Booking BOOK_1 not found")),
            },
            ToolInvocationRecord::failed("Tool execution failed: boom".into()),
        ];
        let text = merge_response("Sure.", "Meeting System Actions Performed", &records);
        assert_eq!(
            text,
            "Sure.\n\n## Meeting System Actions Performed:\n\n\
             ❌ **Cancel Booking:** Booking BOOK_1 not found\n\n\
             ❌ **Error:** Tool execution failed: boom\n\n"
        );
        assert_eq!(merge_response("Only text", "X", &[]), "Only text");
    }

    #[test]
    fn test_failed_error_into_result() {
        let ctx = RequestContext::new("m", "t", "u");
        let err = AgentError::TaskFailed {
            agent: "Aviation HR Agent".into(),
            task_id: "t1".into(),
            message: "HR task failed: boom".into(),
        };
        let result = err.into_failed_result(&ctx, "ignored");
        assert_eq!(result.status, TaskState::Failed);
        assert_eq!(result.task_id, "t1");
        assert_eq!(result.error.as_deref(), Some("HR task failed: boom"));
    }
}
