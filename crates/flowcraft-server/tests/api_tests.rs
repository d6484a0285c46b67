//! ABOUTME: Router-level tests driving requests through `build_app` with
//! ABOUTME: `tower::ServiceExt::oneshot`, mirroring the pack's daemon test style

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use flowcraft_catalog::DefaultCatalogNormalizer;
use flowcraft_core::error::Result;
use flowcraft_core::traits::{AgentRuntime, McpClient};
use flowcraft_core::types::{MCPCatalog, McpCallResponse};
use flowcraft_engine::DefaultExecutionEngine;
use flowcraft_orchestrator::AgentManager;
use flowcraft_server::{build_app, AppState, BearerIdentityBoundary};
use flowcraft_storage::{MemoryBackend, ParsingDecorator};
use flowcraft_tokens::InMemoryTokenStore;
use tower::util::ServiceExt;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct EmptyMcpClient;

#[async_trait]
impl McpClient for EmptyMcpClient {
    async fn get_service_catalog(&self) -> Result<MCPCatalog> {
        Ok(MCPCatalog { services: Vec::new() })
    }

    async fn call(&self, _service: &str, _action: &str, _token: &str, _payload: serde_json::Value) -> Result<McpCallResponse> {
        unimplemented!("not exercised by router tests")
    }
}

struct UnusedAgentRuntime;

#[async_trait]
impl AgentRuntime for UnusedAgentRuntime {
    async fn run(
        &self,
        _user_id: &str,
        _template: &str,
        _inputs: &HashMap<String, serde_json::Value>,
        _output_schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        unimplemented!("not exercised by router tests")
    }
}

fn test_state() -> Arc<AppState> {
    let mcp_client = Arc::new(EmptyMcpClient);
    let normalizer = Arc::new(DefaultCatalogNormalizer::new());
    let storage = Arc::new(ParsingDecorator::new(MemoryBackend::new()));
    let agent_runtime: Arc<dyn AgentRuntime> = Arc::new(UnusedAgentRuntime);

    let agent_manager = Arc::new(AgentManager::new(
        mcp_client.clone(),
        normalizer.clone(),
        agent_runtime.clone(),
        Some(storage.clone()),
    ));
    let engine = Arc::new(DefaultExecutionEngine::new(mcp_client, normalizer, storage.clone()));

    Arc::new(AppState {
        agent_manager,
        agent_runtime,
        engine,
        storage,
        tokens: InMemoryTokenStore::new(Duration::from_secs(3600)),
        identity: Arc::new(BearerIdentityBoundary),
    })
}

async fn request(app: axum::Router, uri: &str, bearer: Option<&str>) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_is_reachable_without_a_bearer_token() {
    let app = build_app(test_state());
    let (status, body) = request(app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_reject_a_missing_bearer_token() {
    let app = build_app(test_state());
    let (status, _) = request(app, "/api/v1/workflows", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_workflows_is_empty_for_a_fresh_user() {
    let app = build_app(test_state());
    let (status, body) = request(app, "/api/v1/workflows", Some("user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn capabilities_returns_the_empty_catalog_view() {
    let app = build_app(test_state());
    let (status, body) = request(app, "/api/v1/capabilities", Some("user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["services"]["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn fetching_an_unknown_workflow_is_not_found() {
    let app = build_app(test_state());
    let (status, _) = request(app, "/api/v1/workflows/does-not-exist", Some("user-1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
