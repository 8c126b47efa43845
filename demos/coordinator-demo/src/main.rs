//! Walkthrough of one coordinated debugging session.
//!
//! Run with: cargo run -p coordinator-demo [-- path/to/swarm.toml]
//!
//! Workers answer from canned text unless `SWARM_DEMO_LIVE=1` is set, in
//! which case the configured analysis command is used.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::StreamExt;
use swarm_debug_core::{
    AnalysisRequest, Analyzer, AnalyzerError, SessionContext, SwarmConfig, Worker,
};
use swarm_debug_executor::{CommandAnalyzer, gateway_from_config};
use swarm_debug_session::Coordinator;
use swarm_debug_store::SqliteMemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ISSUE: &str = "Mobile tab bar is not rendering after the terminal view resizes";

/// Analysis backend selected at startup.
enum DemoAnalyzer {
    Canned,
    Command(CommandAnalyzer),
}

#[async_trait]
impl Analyzer for DemoAnalyzer {
    async fn analyze(
        &self,
        worker: &Worker,
        request: &AnalysisRequest,
    ) -> Result<String, AnalyzerError> {
        match self {
            Self::Command(analyzer) => analyzer.analyze(worker, request).await,
            Self::Canned if request.is_synthesis() => Ok(format!(
                "Apply the {} recommendations in dispatch order, then rerun the mobile layout tests.",
                request.findings().len()
            )),
            Self::Canned => Ok(format!(
                "{} reviewed the issue with {} earlier findings in view.",
                worker.name(),
                request.findings().len()
            )),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("swarm.toml"), PathBuf::from);
    let config = SwarmConfig::load_or_default(&config_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .init();

    let analyzer = if std::env::var_os("SWARM_DEMO_LIVE").is_some() {
        DemoAnalyzer::Command(CommandAnalyzer::from_config(&config.analysis))
    } else {
        DemoAnalyzer::Canned
    };

    let hooks = gateway_from_config(&config.hooks);
    let mut hook_events = hooks.log().history_plus_stream();
    tokio::spawn(async move {
        while let Some(entry) = hook_events.next().await {
            tracing::debug!(hook = %entry.hook, success = entry.success, "Hook recorded");
        }
    });

    let store = SqliteMemoryStore::new(&config.memory_db_path);
    let coordinator = Coordinator::from_config(&config, store, analyzer, hooks);

    let agents = coordinator.initialize().await?;
    tracing::info!(agents, "Swarm ready");

    coordinator
        .broadcast("Debug swarm online, starting tab bar investigation")
        .await;

    let mut context = SessionContext::new();
    context.set("platform", serde_json::json!("mobile"));
    let session = coordinator
        .coordinate_debugging_session(ISSUE, Some(context))
        .await?;

    for (worker, outcome) in session.agent_results.iter() {
        tracing::info!(worker, success = outcome.is_success(), "{outcome}");
    }
    tracing::info!(session_id = %session.session_id, "Solution: {}", session.coordinated_solution);

    let status = coordinator.status().await;
    tracing::info!("Status: {}", serde_json::to_string_pretty(&status)?);

    coordinator.store().close().await;
    Ok(())
}
