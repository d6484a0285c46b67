//! ABOUTME: Component wiring shared by the `flowcraft-server` binary and the
//! ABOUTME: `flowcraft serve` CLI subcommand — one place that assembles AppState

use crate::{build_app, AppState, BearerIdentityBoundary};
use flowcraft_catalog::DefaultCatalogNormalizer;
use flowcraft_config::{FlowcraftConfig, StorageBackendKind};
use flowcraft_core::traits::{AgentRuntime, ExecutionEngine, TokenStore, WorkflowStorage};
use flowcraft_engine::DefaultExecutionEngine;
use flowcraft_llm::{HttpLlmProvider, HttpLlmProviderConfig, StructuredAgentRuntime};
use flowcraft_mcp::{HttpMcpClient, McpClientConfig};
use flowcraft_orchestrator::AgentManager;
use flowcraft_storage::{FilesystemBackend, GcsBackend, MemoryBackend, ParsingDecorator};
use flowcraft_tokens::InMemoryTokenStore;
use std::sync::Arc;
use std::time::Duration;

/// Builds every component from `config` and wires them into an `AppState`,
/// the shared dependency-injection root for both the HTTP binary and the CLI.
pub async fn build_state(config: &FlowcraftConfig) -> Result<Arc<AppState>, Box<dyn std::error::Error>> {
    let mcp_client = Arc::new(HttpMcpClient::new(
        McpClientConfig::new(&config.mcp.base_url).with_timeout(Duration::from_secs(config.mcp.timeout_seconds)),
    )?);
    let normalizer = Arc::new(DefaultCatalogNormalizer::new());

    let storage: Arc<dyn WorkflowStorage> = match config.storage.backend {
        StorageBackendKind::Memory => Arc::new(ParsingDecorator::new(MemoryBackend::new())),
        StorageBackendKind::Filesystem => {
            Arc::new(ParsingDecorator::new(FilesystemBackend::new(config.storage.root.clone())))
        }
        StorageBackendKind::Gcs => {
            let access_token = std::env::var("GCS_SERVICE_ACCOUNT_KEY").unwrap_or_default();
            Arc::new(ParsingDecorator::new(GcsBackend::new(
                config.storage.gcs_bucket.clone(),
                config.storage.gcs_prefix.clone(),
                access_token,
            )))
        }
    };

    let tokens = InMemoryTokenStore::new(Duration::from_secs(config.tokens.ttl_seconds));
    tokens
        .clone()
        .start_sweeping(Duration::from_secs(config.tokens.sweep_interval_seconds));
    let tokens: Arc<dyn TokenStore> = tokens;

    let api_key = std::env::var(&config.llm.api_key_env).unwrap_or_default();
    let mut llm_config = HttpLlmProviderConfig::new(config.llm.base_url.clone(), config.llm.model.clone(), api_key);
    llm_config.timeout = Duration::from_secs(config.llm.timeout_seconds);
    let llm_provider = Arc::new(HttpLlmProvider::new(llm_config));
    let agent_runtime: Arc<dyn AgentRuntime> = Arc::new(StructuredAgentRuntime::new(llm_provider));

    let agent_manager = Arc::new(AgentManager::new(
        mcp_client.clone(),
        normalizer.clone(),
        agent_runtime.clone(),
        Some(storage.clone()),
    ));
    let engine: Arc<dyn ExecutionEngine> = Arc::new(DefaultExecutionEngine::new(
        mcp_client.clone(),
        normalizer.clone(),
        storage.clone(),
    ));

    Ok(Arc::new(AppState {
        agent_manager,
        agent_runtime,
        engine,
        storage,
        tokens,
        identity: Arc::new(BearerIdentityBoundary),
    }))
}

/// Binds and serves the HTTP API until the process is terminated. Fetches
/// the catalog once up front so an unreachable MCP endpoint fails startup
/// instead of surfacing on the first request.
pub async fn serve(config: &FlowcraftConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config).await?;
    state.agent_manager.get_catalog().await?;
    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "flowcraft-server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
