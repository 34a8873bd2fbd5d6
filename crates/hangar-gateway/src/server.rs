//! Gateway HTTP server: Axum router over the agent directory

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use hangar_core::agents::AgentDirectory;
use hangar_core::executor::AgentExecutor;
use hangar_core::types::{AgentExecutionResult, RequestContext, TaskState};

use crate::history::TaskHistory;
use crate::protocol::{ChatMetadata, ChatRequest, ChatResponse, ErrorBody};

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody::new(detail)))
}

/// Shared state for all requests
#[derive(Clone)]
pub struct GatewayState {
    pub directory: Arc<AgentDirectory>,
    pub tenants: Arc<Vec<String>>,
    pub history: TaskHistory,
    pub start_time: Instant,
}

/// The gateway server
pub struct GatewayServer {
    state: GatewayState,
    bind: SocketAddr,
}

impl GatewayServer {
    pub fn new(bind: SocketAddr, directory: Arc<AgentDirectory>, tenants: Vec<String>) -> Self {
        let state = GatewayState {
            directory,
            tenants: Arc::new(tenants),
            history: TaskHistory::new(),
            start_time: Instant::now(),
        };
        Self { state, bind }
    }

    /// Finished task results, most recent 1000
    pub fn history(&self) -> &TaskHistory {
        &self.state.history
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/chat", post(chat_handler))
            .route("/agents", get(agents_handler))
            .route("/agents/{agent_type}/chat", post(agent_chat_handler))
            .route("/agents/{agent_type}/status", get(agent_status_handler))
            .route("/tenants", get(tenants_handler))
            .route("/tasks/{task_id}", get(task_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind).await?;
        info!("Gateway listening on {}", self.bind);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Gateway stopped");
        Ok(())
    }

    /// Start the server (blocks until the process exits)
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(std::future::pending()).await
    }
}

// ── Chat ──

async fn chat_handler(
    State(state): State<GatewayState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let agent = state.directory.route(&req.agent_type);
    handle_chat(&state, agent, req).await.map(Json)
}

async fn agent_chat_handler(
    State(state): State<GatewayState>,
    Path(agent_type): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let agent = state.directory.get(&agent_type).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("Agent type '{}' not found", agent_type),
        )
    })?;
    handle_chat(&state, agent, req).await.map(Json)
}

async fn handle_chat(
    state: &GatewayState,
    agent: Arc<dyn AgentExecutor>,
    req: ChatRequest,
) -> Result<ChatResponse, ApiError> {
    if req.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Message must not be empty"));
    }
    if !state.tenants.contains(&req.tenant_id) {
        debug!("Request for unlisted tenant '{}'", req.tenant_id);
    }
    if !req.context.is_empty() {
        debug!("Ignoring {} client context keys", req.context.len());
    }

    let ctx = RequestContext::new(req.message, req.tenant_id.clone(), req.user_id);
    info!(
        "Chat task {} for tenant {} → {}",
        ctx.task_id,
        ctx.tenant_id,
        agent.agent_type()
    );

    let started = Instant::now();
    let result = match agent.execute(ctx.clone()).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Task {} failed: {}", ctx.task_id, e);
            e.into_failed_result(&ctx, agent.name())
        }
    };
    let execution_time = started.elapsed().as_secs_f64();

    let response = ChatResponse {
        response: response_text(&result),
        agent_name: result.agent_name.clone(),
        task_id: result.task_id.clone(),
        execution_time,
        metadata: ChatMetadata {
            tenant_id: req.tenant_id,
            agent_type: agent.agent_type().to_string(),
            status: result.status,
            artifacts_count: result.artifacts.len(),
        },
    };
    state.history.record(result).await;
    Ok(response)
}

/// Text shown to the user for a finished task
pub fn response_text(result: &AgentExecutionResult) -> String {
    match result.status {
        TaskState::Completed => result.primary_content().unwrap_or_default().to_string(),
        _ => format!(
            "I encountered an error: {}",
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

// ── Directory ──

async fn agents_handler(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "available_agents": state.directory.list_agents(),
        "available_tenants": state.tenants.as_slice(),
        "system_status": "operational",
    }))
}

async fn agent_status_handler(
    State(state): State<GatewayState>,
    Path(agent_type): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let info = state.directory.describe(&agent_type).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("Agent type '{}' not found", agent_type),
        )
    })?;
    Ok(Json(json!({
        "agent_name": info.agent_name,
        "agent_type": info.agent_type,
        "model": info.model,
        "tools": info.tools,
        "status": "ready",
    })))
}

async fn tenants_handler(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({ "tenants": state.tenants.as_slice() }))
}

async fn task_handler(
    State(state): State<GatewayState>,
    Path(task_id): Path<String>,
) -> Result<Json<AgentExecutionResult>, ApiError> {
    state.history.get(&task_id).await.map(Json).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("Task '{}' not found", task_id),
        )
    })
}

async fn health_handler(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "agents": state.directory.list_agents(),
        "model": state.directory.model(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}
