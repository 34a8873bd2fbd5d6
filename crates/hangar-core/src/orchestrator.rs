//! Multi-agent orchestration
//!
//! Classifies a message, fans out to the matching domain agents and
//! synthesizes one response. One agent is a pass-through; several run
//! concurrently and are merged by a further completion call, with a
//! deterministic concatenation when that call is unavailable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, warn};

use crate::classifier::DomainClassifier;
use crate::executor::{AgentError, AgentExecutor};
use crate::providers::{CompletionProvider, complete_or_demo};
use crate::task::{TaskEvent, TaskUpdater};
use crate::types::{AgentExecutionResult, Domain, RequestContext, TaskState};

pub const ORCHESTRATOR_NAME: &str = "Aviation Orchestrator Agent";
pub const ORCHESTRATOR_TYPE: &str = "orchestrator";

const ORCHESTRATOR_SYSTEM_PROMPT: &str = "You are the Aviation Multi-Agent System Orchestrator, \
coordinating specialized aviation agents to fulfil user requests.

Available specialized agents:
- HR Agent: employee management, certifications, training, compliance
- Meeting Agent: room booking, meeting coordination, scheduling
- Supply Chain Agent: inventory, procurement, supplier management

Answer general aviation questions directly. When several agents have responded, \
merge their answers into one clear, professional response.";

/// Configuration for the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_concurrent_branches: usize,
    pub branch_timeout_secs: u64,
    /// Deadline for a single completion call before demo text is used
    pub completion_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_branches: 5,
            branch_timeout_secs: 120,
            completion_timeout_secs: 60,
        }
    }
}

impl OrchestratorConfig {
    /// Completion deadline, capped at three quarters of the branch timeout so
    /// a stalled model still leaves the branch time to run its tools
    pub fn completion_budget(&self) -> Duration {
        let configured = Duration::from_secs(self.completion_timeout_secs);
        let cap = Duration::from_secs(self.branch_timeout_secs) * 3 / 4;
        configured.min(cap)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    Completed,
    Failed,
    TimedOut,
}

impl std::fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Outcome of one delegated domain agent
#[derive(Debug, Clone, PartialEq)]
pub struct BranchResult {
    pub domain: Domain,
    pub status: BranchStatus,
    /// Artifact content on success, an error description otherwise
    pub content: String,
}

impl BranchResult {
    fn failed(domain: Domain, status: BranchStatus, message: String) -> Self {
        Self {
            domain,
            status,
            content: format!("Agent execution failed: {}", message),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == BranchStatus::Completed
    }
}

/// Routes requests to domain agents and merges their output
pub struct Orchestrator {
    classifier: Box<dyn DomainClassifier>,
    agents: Vec<(Domain, Arc<dyn AgentExecutor>)>,
    provider: Option<Arc<dyn CompletionProvider>>,
    config: OrchestratorConfig,
    progress: Option<mpsc::UnboundedSender<TaskEvent>>,
}

impl Orchestrator {
    pub fn new(
        classifier: Box<dyn DomainClassifier>,
        agents: Vec<(Domain, Arc<dyn AgentExecutor>)>,
        provider: Option<Arc<dyn CompletionProvider>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            classifier,
            agents,
            provider,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: mpsc::UnboundedSender<TaskEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn agent_for(&self, domain: Domain) -> Option<Arc<dyn AgentExecutor>> {
        self.agents
            .iter()
            .find(|(d, _)| *d == domain)
            .map(|(_, a)| a.clone())
    }

    /// Classified domains that have a registered agent
    pub fn route(&self, message: &str) -> Vec<Domain> {
        self.classifier
            .classify(message)
            .into_iter()
            .filter(|d| {
                let known = self.agents.iter().any(|(domain, _)| domain == d);
                if !known {
                    warn!("No agent registered for domain {}, skipping", d);
                }
                known
            })
            .collect()
    }

    /// Run one domain agent in isolation with a timeout
    async fn run_branch(
        domain: Domain,
        agent: Arc<dyn AgentExecutor>,
        ctx: RequestContext,
        timeout: Duration,
    ) -> BranchResult {
        debug!("Delegating task {} to {}", ctx.task_id, agent.name());
        match tokio::time::timeout(timeout, agent.execute(ctx)).await {
            Ok(Ok(result)) => Self::branch_from_result(domain, result),
            Ok(Err(e)) => BranchResult::failed(domain, BranchStatus::Failed, e.to_string()),
            Err(_) => BranchResult::failed(
                domain,
                BranchStatus::TimedOut,
                format!("timed out after {}s", timeout.as_secs()),
            ),
        }
    }

    fn branch_from_result(domain: Domain, result: AgentExecutionResult) -> BranchResult {
        match (result.status, result.primary_content()) {
            (TaskState::Completed, Some(content)) => BranchResult {
                domain,
                status: BranchStatus::Completed,
                content: content.to_string(),
            },
            _ => BranchResult::failed(
                domain,
                BranchStatus::Failed,
                result
                    .error
                    .unwrap_or_else(|| format!("{} returned no artifact", result.agent_name)),
            ),
        }
    }

    /// Execute the selected agents in spawned tasks; waits for every branch.
    ///
    /// A panicking agent surfaces as a failed branch.
    async fn run_branches(&self, domains: &[Domain], ctx: &RequestContext) -> Vec<BranchResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_branches.max(1)));
        let timeout = Duration::from_secs(self.config.branch_timeout_secs);

        let mut handles = Vec::new();
        for &domain in domains {
            let Some(agent) = self.agent_for(domain) else {
                continue;
            };
            let sem = semaphore.clone();
            let branch_ctx = ctx.derive_for(domain.tag());
            handles.push((
                domain,
                tokio::spawn(async move {
                    let _permit = sem.acquire().await.ok();
                    Self::run_branch(domain, agent, branch_ctx, timeout).await
                }),
            ));
        }

        let mut results = Vec::new();
        for (domain, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => results.push(BranchResult::failed(
                    domain,
                    BranchStatus::Failed,
                    format!("task panicked: {}", e),
                )),
            }
        }
        results
    }

    /// Prompt asking the model to merge several agents' answers
    pub fn synthesis_prompt(message: &str, branches: &[BranchResult]) -> String {
        let mut prompt = format!(
            "Based on the user query: \"{}\"\n\n\
             The following specialized agents have provided responses:\n\n",
            message
        );
        for branch in branches {
            if branch.succeeded() {
                prompt.push_str(&format!(
                    "**{} Agent Response:**\n{}\n\n",
                    branch.domain.label(),
                    branch.content
                ));
            } else {
                prompt.push_str(&format!(
                    "**{} Agent:** Failed to process request\n\n",
                    branch.domain.label()
                ));
            }
        }
        prompt.push_str(
            "Please synthesize these responses into a single, coherent response that addresses \
             the user's query comprehensively. Organize the information logically and highlight \
             key insights from each agent.",
        );
        prompt
    }

    /// Deterministic concatenation used when synthesis is unavailable
    pub fn fallback_synthesis(branches: &[BranchResult]) -> String {
        let mut out = String::from("Here are the responses from our specialized agents:\n\n");
        for branch in branches {
            let body = if branch.succeeded() {
                branch.content.as_str()
            } else {
                "Failed to process request"
            };
            out.push_str(&format!("## {} Agent:\n{}\n\n", branch.domain.label(), body));
        }
        out
    }

    async fn synthesize(&self, message: &str, branches: &[BranchResult]) -> String {
        let Some(provider) = &self.provider else {
            debug!("No completion provider configured, using fallback synthesis");
            return Self::fallback_synthesis(branches);
        };
        let prompt = Self::synthesis_prompt(message, branches);
        let budget = self.config.completion_budget();
        let completion = provider.complete(ORCHESTRATOR_SYSTEM_PROMPT, &prompt, None);
        match tokio::time::timeout(budget, completion).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                error!("Synthesis failed: {}", e);
                Self::fallback_synthesis(branches)
            }
            Err(_) => {
                error!("Synthesis timed out after {}ms", budget.as_millis());
                Self::fallback_synthesis(branches)
            }
        }
    }

    async fn run(&self, ctx: &RequestContext, task: &mut TaskUpdater) -> Result<(), AgentError> {
        task.update_status("Analyzing request and routing to agents", Some(10.0))?;
        let domains = self.route(&ctx.user_message);
        info!(
            "Task {} routed to {:?}",
            ctx.task_id,
            domains.iter().map(|d| d.tag()).collect::<Vec<_>>()
        );

        let (content, artifact_type, branches) = if domains.is_empty() {
            task.update_status("Handling general request", Some(25.0))?;
            let text = complete_or_demo(
                self.provider.as_deref(),
                ORCHESTRATOR_SYSTEM_PROMPT,
                &ctx.user_message,
                ORCHESTRATOR_NAME,
                "multi-agent coordination",
                self.agents.len(),
                Some(self.config.completion_budget()),
            )
            .await;
            task.update_status("Synthesizing agent responses", Some(75.0))?;
            (text, "general_response", Vec::new())
        } else {
            task.update_status(
                &format!("Delegating to {} agent(s)", domains.len()),
                Some(25.0),
            )?;
            let branches = self.run_branches(&domains, ctx).await;
            for branch in branches.iter().filter(|b| !b.succeeded()) {
                warn!("{} branch {}: {}", branch.domain, branch.status, branch.content);
            }

            task.update_status("Synthesizing agent responses", Some(75.0))?;
            let content = match branches.as_slice() {
                [single] => single.content.clone(),
                many => self.synthesize(&ctx.user_message, many).await,
            };
            (content, "orchestrated_response", branches)
        };

        let mut metadata = Map::new();
        metadata.insert("agent_type".into(), json!(ORCHESTRATOR_TYPE));
        metadata.insert(
            "sub_agents_used".into(),
            json!(branches.iter().map(|b| b.domain.tag()).collect::<Vec<_>>()),
        );
        metadata.insert(
            "failed_agents".into(),
            json!(branches
                .iter()
                .filter(|b| !b.succeeded())
                .map(|b| b.domain.tag())
                .collect::<Vec<_>>()),
        );
        metadata.insert("tenant_id".into(), json!(ctx.tenant_id));

        task.add_artifact(content, artifact_type, metadata)?;
        task.complete()?;
        Ok(())
    }
}

#[async_trait]
impl AgentExecutor for Orchestrator {
    fn name(&self) -> &str {
        ORCHESTRATOR_NAME
    }

    fn agent_type(&self) -> &str {
        ORCHESTRATOR_TYPE
    }

    async fn execute(&self, ctx: RequestContext) -> Result<AgentExecutionResult, AgentError> {
        let mut task = TaskUpdater::new(ctx.task_id.clone(), ORCHESTRATOR_NAME);
        if let Some(tx) = &self.progress {
            task = task.with_events(tx.clone());
        }

        match self.run(&ctx, &mut task).await {
            Ok(()) => Ok(task.into_result()),
            Err(e) => {
                let message = format!("Orchestration failed: {}", e);
                error!("{}", message);
                if let Err(fail_err) = task.fail(message.clone()) {
                    warn!("Could not mark task {} failed: {}", ctx.task_id, fail_err);
                }
                Err(AgentError::TaskFailed {
                    agent: ORCHESTRATOR_NAME.to_string(),
                    task_id: ctx.task_id,
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::testing::{
        FailingProvider, MockAgent, MockBehavior, ScriptedProvider, StalledProvider,
    };
    use std::collections::HashSet;

    struct Fixture {
        hr: Arc<MockAgent>,
        meeting: Arc<MockAgent>,
        supply: Arc<MockAgent>,
    }

    impl Fixture {
        fn new(hr: MockAgent, meeting: MockAgent, supply: MockAgent) -> Self {
            Self {
                hr: Arc::new(hr),
                meeting: Arc::new(meeting),
                supply: Arc::new(supply),
            }
        }

        fn standard() -> Self {
            Self::new(
                MockAgent::replying("hr", "HR content"),
                MockAgent::replying("meeting", "Meeting content"),
                MockAgent::replying("supply_chain", "Supply content"),
            )
        }

        fn orchestrator(
            &self,
            provider: Option<Arc<dyn CompletionProvider>>,
            config: OrchestratorConfig,
        ) -> Orchestrator {
            Orchestrator::new(
                Box::new(KeywordClassifier::default()),
                vec![
                    (Domain::Hr, self.hr.clone() as Arc<dyn AgentExecutor>),
                    (Domain::Meeting, self.meeting.clone() as Arc<dyn AgentExecutor>),
                    (Domain::SupplyChain, self.supply.clone() as Arc<dyn AgentExecutor>),
                ],
                provider,
                config,
            )
        }
    }

    fn sub_agents(result: &AgentExecutionResult) -> HashSet<String> {
        result.artifacts[0].metadata["sub_agents_used"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_single_domain_pass_through() {
        let fx = Fixture::standard();
        let provider = Arc::new(ScriptedProvider::new("should not be used"));
        let orch = fx.orchestrator(Some(provider.clone()), OrchestratorConfig::default());
        let ctx = RequestContext::new(
            "I need to schedule a training session for employee EMP_001",
            "acme",
            "alice",
        );

        let result = orch.execute(ctx.clone()).await.unwrap();
        assert_eq!(result.status, TaskState::Completed);
        assert_eq!(result.primary_content(), Some("HR content"));
        assert_eq!(result.artifacts[0].artifact_type, "orchestrated_response");
        assert_eq!(result.artifacts[0].metadata["agent_type"], "orchestrator");
        assert_eq!(result.artifacts[0].metadata["tenant_id"], "acme");
        assert_eq!(sub_agents(&result), HashSet::from(["hr".to_string()]));

        assert_eq!(fx.hr.seen_task_ids(), vec![format!("{}_hr", ctx.task_id)]);
        assert!(fx.meeting.seen_task_ids().is_empty());
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_multi_domain_synthesis() {
        let fx = Fixture::standard();
        let provider = Arc::new(ScriptedProvider::new("Merged answer"));
        let orch = fx.orchestrator(Some(provider.clone()), OrchestratorConfig::default());
        let ctx = RequestContext::new(
            "book a conference room for tomorrow and also check employee certifications",
            "default",
            "system",
        );

        let result = orch.execute(ctx.clone()).await.unwrap();
        assert_eq!(result.primary_content(), Some("Merged answer"));
        assert_eq!(
            sub_agents(&result),
            HashSet::from(["hr".to_string(), "meeting".to_string()])
        );
        assert!(fx.supply.seen_task_ids().is_empty());
        assert_eq!(fx.meeting.seen_task_ids(), vec![format!("{}_meeting", ctx.task_id)]);

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Based on the user query: \"book a conference room"));
        assert!(prompts[0].contains("**Hr Agent Response:**\nHR content\n\n"));
        assert!(prompts[0].contains("**Meeting Agent Response:**\nMeeting content\n\n"));
    }

    #[tokio::test]
    async fn test_failed_branch_is_isolated() {
        let fx = Fixture::new(
            MockAgent::new("hr", MockBehavior::Fail("database down".into())),
            MockAgent::replying("meeting", "Meeting content"),
            MockAgent::replying("supply_chain", "Supply content"),
        );
        let provider = Arc::new(ScriptedProvider::new("Merged"));
        let orch = fx.orchestrator(Some(provider.clone()), OrchestratorConfig::default());

        let result = orch
            .execute(RequestContext::new(
                "train staff, book a room and order parts",
                "default",
                "system",
            ))
            .await
            .unwrap();
        assert_eq!(result.status, TaskState::Completed);
        assert_eq!(sub_agents(&result).len(), 3);
        assert_eq!(result.artifacts[0].metadata["failed_agents"], json!(["hr"]));

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("**Hr Agent:** Failed to process request"));
        assert!(prompt.contains("Meeting content"));
        assert!(prompt.contains("Supply content"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_falls_back() {
        let fx = Fixture::new(
            MockAgent::replying("hr", "HR content"),
            MockAgent::new("meeting", MockBehavior::Panic),
            MockAgent::replying("supply_chain", "Supply content"),
        );
        let orch = fx.orchestrator(
            Some(Arc::new(FailingProvider::new("status 503"))),
            OrchestratorConfig::default(),
        );

        let result = orch
            .execute(RequestContext::new(
                "check employee records and reserve a meeting slot",
                "default",
                "system",
            ))
            .await
            .unwrap();
        assert_eq!(result.status, TaskState::Completed);
        assert_eq!(
            result.primary_content(),
            Some(
                "Here are the responses from our specialized agents:\n\n\
                 ## Hr Agent:\nHR content\n\n\
                 ## Meeting Agent:\nFailed to process request\n\n"
            )
        );
    }

    #[tokio::test]
    async fn test_no_provider_uses_fallback() {
        let fx = Fixture::standard();
        let orch = fx.orchestrator(None, OrchestratorConfig::default());
        let result = orch
            .execute(RequestContext::new("staff and inventory", "default", "system"))
            .await
            .unwrap();
        let content = result.primary_content().unwrap();
        assert!(content.contains("## Hr Agent:\nHR content"));
        assert!(content.contains("## Supply Chain Agent:\nSupply content"));
    }

    #[tokio::test]
    async fn test_general_path() {
        let fx = Fixture::standard();
        let provider = Arc::new(ScriptedProvider::new("Clear skies."));
        let orch = fx.orchestrator(Some(provider), OrchestratorConfig::default());
        let result = orch
            .execute(RequestContext::new("what's the weather", "default", "system"))
            .await
            .unwrap();
        assert_eq!(result.artifacts[0].artifact_type, "general_response");
        assert_eq!(result.primary_content(), Some("Clear skies."));
        assert!(sub_agents(&result).is_empty());
        assert!(fx.hr.seen_task_ids().is_empty());
        assert!(fx.meeting.seen_task_ids().is_empty());
        assert!(fx.supply.seen_task_ids().is_empty());
    }

    #[tokio::test]
    async fn test_general_path_without_provider_is_demo() {
        let fx = Fixture::standard();
        let orch = fx.orchestrator(None, OrchestratorConfig::default());
        let result = orch
            .execute(RequestContext::new("hello there", "default", "system"))
            .await
            .unwrap();
        assert!(result.primary_content().unwrap().starts_with("[DEMO MODE]"));
    }

    #[tokio::test]
    async fn test_single_domain_failure_passes_error_text() {
        let fx = Fixture::new(
            MockAgent::new("hr", MockBehavior::Fail("HR task failed: boom".into())),
            MockAgent::replying("meeting", "m"),
            MockAgent::replying("supply_chain", "s"),
        );
        let orch = fx.orchestrator(None, OrchestratorConfig::default());
        let result = orch
            .execute(RequestContext::new("onboard a pilot", "default", "system"))
            .await
            .unwrap();
        assert_eq!(result.status, TaskState::Completed);
        let content = result.primary_content().unwrap();
        assert!(content.starts_with("Agent execution failed:"));
        assert!(content.contains("boom"));
    }

    #[tokio::test]
    async fn test_branch_timeout() {
        let fx = Fixture::new(
            MockAgent::new("hr", MockBehavior::Sleep(Duration::from_secs(30))),
            MockAgent::replying("meeting", "Meeting content"),
            MockAgent::replying("supply_chain", "s"),
        );
        let orch = fx.orchestrator(
            None,
            OrchestratorConfig {
                max_concurrent_branches: 2,
                branch_timeout_secs: 1,
                ..OrchestratorConfig::default()
            },
        );
        let result = orch
            .execute(RequestContext::new("staff meeting", "default", "system"))
            .await
            .unwrap();
        assert_eq!(result.artifacts[0].metadata["failed_agents"], json!(["hr"]));
        assert!(result.primary_content().unwrap().contains("Meeting content"));
    }

    #[tokio::test]
    async fn test_unregistered_domain_is_skipped() {
        let hr = Arc::new(MockAgent::replying("hr", "HR content"));
        let orch = Orchestrator::new(
            Box::new(KeywordClassifier::default()),
            vec![(Domain::Hr, hr.clone() as Arc<dyn AgentExecutor>)],
            None,
            OrchestratorConfig::default(),
        );
        assert_eq!(orch.route("book a room for the staff"), vec![Domain::Hr]);
        let result = orch
            .execute(RequestContext::new("book a room", "default", "system"))
            .await
            .unwrap();
        assert_eq!(result.artifacts[0].artifact_type, "general_response");
    }

    #[tokio::test]
    async fn test_progress_checkpoints() {
        let fx = Fixture::standard();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let orch = fx
            .orchestrator(None, OrchestratorConfig::default())
            .with_progress(tx);
        orch.execute(RequestContext::new("staff and rooms", "default", "system"))
            .await
            .unwrap();
        drop(orch);

        let mut progress = Vec::new();
        while let Some(event) = rx.recv().await {
            progress.push(event.progress);
        }
        assert_eq!(progress, vec![Some(10.0), Some(25.0), Some(75.0), Some(100.0)]);
    }

    #[test]
    fn test_config_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_concurrent_branches, 5);
        assert_eq!(config.branch_timeout_secs, 120);
        assert_eq!(config.completion_budget(), Duration::from_secs(60));
        assert_eq!(BranchStatus::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn test_completion_budget_stays_inside_branch_timeout() {
        let config = OrchestratorConfig {
            branch_timeout_secs: 1,
            completion_timeout_secs: 60,
            ..OrchestratorConfig::default()
        };
        assert_eq!(config.completion_budget(), Duration::from_millis(750));

        let config = OrchestratorConfig {
            branch_timeout_secs: 120,
            completion_timeout_secs: 200,
            ..OrchestratorConfig::default()
        };
        assert_eq!(config.completion_budget(), Duration::from_secs(90));
    }

    #[tokio::test]
    async fn test_single_domain_panic_is_isolated() {
        let fx = Fixture::new(
            MockAgent::new("hr", MockBehavior::Panic),
            MockAgent::replying("meeting", "m"),
            MockAgent::replying("supply_chain", "s"),
        );
        let orch = fx.orchestrator(None, OrchestratorConfig::default());
        let result = orch
            .execute(RequestContext::new("onboard a pilot", "default", "system"))
            .await
            .unwrap();
        assert_eq!(result.status, TaskState::Completed);
        assert_eq!(result.artifacts[0].metadata["failed_agents"], json!(["hr"]));
        let content = result.primary_content().unwrap();
        assert!(content.starts_with("Agent execution failed: task panicked"));
    }

    #[tokio::test]
    async fn test_stalled_synthesis_falls_back() {
        let fx = Fixture::standard();
        let orch = fx.orchestrator(
            Some(Arc::new(StalledProvider::new(Duration::from_secs(5)))),
            OrchestratorConfig {
                completion_timeout_secs: 1,
                ..OrchestratorConfig::default()
            },
        );
        let result = orch
            .execute(RequestContext::new("staff and inventory", "default", "system"))
            .await
            .unwrap();
        let content = result.primary_content().unwrap();
        assert!(content.starts_with("Here are the responses from our specialized agents:"));
        assert!(content.contains("## Supply Chain Agent:\nSupply content"));
    }
}
