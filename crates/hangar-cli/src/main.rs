use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::HangarConfig;
use hangar_core::agents::AgentDirectory;
use hangar_core::task::TaskEvent;
use hangar_core::types::RequestContext;
use hangar_gateway::GatewayServer;
use hangar_gateway::server::response_text;

#[derive(Parser)]
#[command(name = "hangar")]
#[command(version)]
#[command(about = "Hangar: multi-agent assistant for aviation back-office work")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Send a one-shot message to an agent
    Ask {
        /// The message to send
        message: String,

        /// Agent type (orchestrator, hr, meeting, supply_chain)
        #[arg(short, long, default_value = "orchestrator")]
        agent: String,

        #[arg(short, long, default_value = "default")]
        tenant: String,

        #[arg(short, long, default_value = "system")]
        user: String,
    },

    /// List available agents and their tools
    Agents,

    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Init => cmd_init(),
        Commands::Config => cmd_config(&cli.config),
        Commands::Agents => cmd_agents(&cli.config),
        Commands::Serve { bind } => cmd_serve(&cli.config, bind).await,
        Commands::Ask {
            message,
            agent,
            tenant,
            user,
        } => cmd_ask(&cli.config, &message, &agent, &tenant, &user).await,
    }
}

fn cmd_init() -> Result<()> {
    let dir = config::config_dir();
    let (path, created) = config::write_default_config(&dir)?;
    if created {
        info!("Created default config at {}", path.display());
    } else {
        warn!("Config already exists at {}", path.display());
    }

    println!("Hangar initialized at {}", dir.display());
    println!("Edit {} to configure your model provider.", path.display());
    Ok(())
}

fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = HangarConfig::load(config_path)?;
    println!("{}", toml::to_string_pretty(&cfg.redacted())?);
    Ok(())
}

fn build_directory(
    cfg: &HangarConfig,
    progress: Option<mpsc::UnboundedSender<TaskEvent>>,
) -> Result<AgentDirectory> {
    let provider = cfg.build_provider()?;
    if provider.is_none() {
        warn!("No model provider configured, agents will answer in demo mode");
    }
    Ok(AgentDirectory::build(
        provider,
        cfg.orchestrator.clone(),
        progress,
    ))
}

fn cmd_agents(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = HangarConfig::load_or_default(config_path)?;
    let directory = build_directory(&cfg, None)?;

    println!("Model: {}", directory.model());
    for agent_type in directory.list_agents() {
        if let Some(agent) = directory.describe(agent_type) {
            println!("{:<14} {}", agent.agent_type, agent.agent_name);
            for tool in &agent.tools {
                println!("{:<14}   - {}", "", tool);
            }
        }
    }
    Ok(())
}

async fn cmd_ask(
    config_path: &Option<PathBuf>,
    message: &str,
    agent_type: &str,
    tenant: &str,
    user: &str,
) -> Result<()> {
    let cfg = HangarConfig::load_or_default(config_path)?;
    let directory = build_directory(&cfg, None)?;
    let agent = directory.route(agent_type);

    let ctx = RequestContext::new(message, tenant, user);
    let result = match agent.execute(ctx.clone()).await {
        Ok(result) => result,
        Err(e) => e.into_failed_result(&ctx, agent.name()),
    };

    println!("{}", response_text(&result));
    Ok(())
}

async fn cmd_serve(config_path: &Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let mut cfg = HangarConfig::load_or_default(config_path)?;
    if let Some(bind) = bind {
        cfg.gateway.bind = bind;
    }
    let addr = cfg.gateway.socket_addr()?;
    info!("Starting Hangar gateway...");

    let cancel = CancellationToken::new();

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<TaskEvent>();
    let directory = Arc::new(build_directory(&cfg, Some(progress_tx))?);
    info!("Agents ready: {}", directory.list_agents().join(", "));

    let progress_cancel = cancel.clone();
    let progress_loop = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = progress_cancel.cancelled() => break,
                event = progress_rx.recv() => match event {
                    Some(event) => debug!(
                        "Task {} {} {:?}: {}",
                        event.task_id,
                        event.state,
                        event.progress,
                        event.message
                    ),
                    None => break,
                },
            }
        }
    });

    let server = GatewayServer::new(addr, directory, cfg.tenants.ids.clone());
    let shutdown = cancel.clone();
    let server_task = tokio::spawn(async move {
        server
            .run_until(async move { shutdown.cancelled().await })
            .await
    });

    signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");
    cancel.cancel();

    server_task
        .await
        .context("Gateway task panicked")??;
    let _ = progress_loop.await;

    println!("Hangar stopped.");
    Ok(())
}
