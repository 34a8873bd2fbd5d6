//! Agent directory that builds every agent once and routes by agent type

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::profile::DomainProfile;
use crate::classifier::KeywordClassifier;
use crate::executor::{AgentExecutor, DomainAgentExecutor};
use crate::orchestrator::{ORCHESTRATOR_NAME, ORCHESTRATOR_TYPE, Orchestrator, OrchestratorConfig};
use crate::planner::KeywordToolPlanner;
use crate::providers::CompletionProvider;
use crate::task::TaskEvent;
use crate::tools::{ToolRegistry, hr, meeting, supply_chain};
use crate::types::Domain;

/// Summary of one agent for status listings
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub agent_name: String,
    pub agent_type: String,
    pub model: String,
    pub tools: Vec<String>,
}

/// Owns the orchestrator and the domain agents for the process lifetime
pub struct AgentDirectory {
    orchestrator: Arc<Orchestrator>,
    domain_agents: Vec<Arc<DomainAgentExecutor>>,
    model: String,
}

impl AgentDirectory {
    /// Build the stores, tool registries, domain agents and orchestrator.
    ///
    /// Without a provider every completion falls back to demo text.
    pub fn build(
        provider: Option<Arc<dyn CompletionProvider>>,
        config: OrchestratorConfig,
        progress: Option<mpsc::UnboundedSender<TaskEvent>>,
    ) -> Self {
        let model = provider
            .as_ref()
            .map(|p| p.model().to_string())
            .unwrap_or_else(|| "demo".to_string());

        let completion_budget = config.completion_budget();
        let domain_agents: Vec<Arc<DomainAgentExecutor>> = Domain::ALL
            .into_iter()
            .map(|domain| {
                let (registry, planner) = domain_tools(domain);
                let mut executor = DomainAgentExecutor::new(
                    DomainProfile::for_domain(domain),
                    Arc::new(registry),
                    Box::new(planner),
                    provider.clone(),
                )
                .with_completion_budget(completion_budget);
                if let Some(tx) = &progress {
                    executor = executor.with_progress(tx.clone());
                }
                Arc::new(executor)
            })
            .collect();

        let routes = domain_agents
            .iter()
            .map(|a| (a.profile().domain, a.clone() as Arc<dyn AgentExecutor>))
            .collect();
        let mut orchestrator = Orchestrator::new(
            Box::new(KeywordClassifier::default()),
            routes,
            provider,
            config,
        );
        if let Some(tx) = progress {
            orchestrator = orchestrator.with_progress(tx);
        }

        info!(
            "Agent directory ready: {} domain agents, model {}",
            domain_agents.len(),
            model
        );
        Self {
            orchestrator: Arc::new(orchestrator),
            domain_agents,
            model,
        }
    }

    /// Agent registered for `agent_type`, if any
    pub fn get(&self, agent_type: &str) -> Option<Arc<dyn AgentExecutor>> {
        if agent_type == ORCHESTRATOR_TYPE {
            return Some(self.orchestrator.clone());
        }
        self.domain_agents
            .iter()
            .find(|a| a.agent_type() == agent_type)
            .map(|a| a.clone() as Arc<dyn AgentExecutor>)
    }

    /// Agent for `agent_type`, falling back to the orchestrator
    pub fn route(&self, agent_type: &str) -> Arc<dyn AgentExecutor> {
        match self.get(agent_type) {
            Some(agent) => agent,
            None => {
                debug!("Unknown agent type '{}', using orchestrator", agent_type);
                self.orchestrator.clone()
            }
        }
    }

    /// Agent types in a stable order, orchestrator first
    pub fn list_agents(&self) -> Vec<&str> {
        std::iter::once(ORCHESTRATOR_TYPE)
            .chain(self.domain_agents.iter().map(|a| a.agent_type()))
            .collect()
    }

    pub fn describe(&self, agent_type: &str) -> Option<AgentInfo> {
        if agent_type == ORCHESTRATOR_TYPE {
            return Some(AgentInfo {
                agent_name: ORCHESTRATOR_NAME.to_string(),
                agent_type: ORCHESTRATOR_TYPE.to_string(),
                model: self.model.clone(),
                tools: Vec::new(),
            });
        }
        self.domain_agents
            .iter()
            .find(|a| a.agent_type() == agent_type)
            .map(|a| AgentInfo {
                agent_name: a.name().to_string(),
                agent_type: a.agent_type().to_string(),
                model: self.model.clone(),
                tools: a.tool_names(),
            })
    }

    /// Model behind the agents, or "demo" when none is configured
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// A fresh store for `domain`, with its tools and planner
fn domain_tools(domain: Domain) -> (ToolRegistry, KeywordToolPlanner) {
    match domain {
        Domain::Hr => (hr::registry(Arc::new(hr::HrStore::new())), hr::planner()),
        Domain::Meeting => (
            meeting::registry(Arc::new(meeting::MeetingStore::new())),
            meeting::planner(),
        ),
        Domain::SupplyChain => (
            supply_chain::registry(Arc::new(supply_chain::SupplyChainStore::new())),
            supply_chain::planner(),
        ),
    }
}
