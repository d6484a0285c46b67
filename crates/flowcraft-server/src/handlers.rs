//! ABOUTME: One handler per route in the external interface table — each
//! ABOUTME: extracts `AuthContext`, calls into a component, and maps the result to JSON

use crate::{bad_input, AppState, ApiError, AuthContext};
use axum::extract::{Path, State};
use axum::Json;
use flowcraft_core::traits::{ExecutionEngine, TokenStore, WorkflowStorage};
use flowcraft_core::types::WorkflowFile;
use flowcraft_pipeline::{
    run_intent_analyst, run_intent_gatherer, IntentAnalystInput, IntentGathererInput, StructuredIntent,
    ValidatedIntent,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn capabilities(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<Json<Value>, ApiError> {
    let catalog = state.agent_manager.get_catalog().await?;
    let view = state.agent_manager.user_capabilities(&catalog, &auth.user);
    Ok(Json(serde_json::to_value(view).map_err(|e| bad_input(e.to_string()))?))
}

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    pub user_message: String,
}

pub async fn workflow_discover(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<DiscoverRequest>,
) -> Result<Json<StructuredIntent>, ApiError> {
    let input = IntentGathererInput {
        user_message: body.user_message,
        conversation_history: Vec::new(),
        discovery_phase: "initial".to_string(),
        collected_intent: Value::Null,
    };
    let result = run_intent_gatherer(state.agent_runtime.as_ref(), None, &auth.user.id, input).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ContinueRequest {
    pub user_message: String,
    #[serde(default)]
    pub conversation_history: Vec<String>,
    #[serde(default)]
    pub collected_intent: Value,
}

pub async fn workflow_continue(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<ContinueRequest>,
) -> Result<Json<StructuredIntent>, ApiError> {
    let input = IntentGathererInput {
        user_message: body.user_message,
        conversation_history: body.conversation_history,
        discovery_phase: "continue".to_string(),
        collected_intent: body.collected_intent,
    };
    let result = run_intent_gatherer(state.agent_runtime.as_ref(), None, &auth.user.id, input).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub structured_intent: StructuredIntent,
}

pub async fn intent_analyze(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ValidatedIntent>, ApiError> {
    let catalog = state.agent_manager.get_catalog().await?;
    let capabilities = state.agent_manager.user_capabilities(&catalog, &auth.user);
    let input = IntentAnalystInput {
        structured_intent: body.structured_intent,
        user_capabilities: serde_json::to_value(&capabilities).map_err(|e| bad_input(e.to_string()))?,
        service_schemas: serde_json::to_value(&catalog).map_err(|e| bad_input(e.to_string()))?,
    };
    let result = run_intent_analyst(state.agent_runtime.as_ref(), None, &auth.user.id, input).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub raw_user_message: String,
    #[serde(default)]
    pub workflow_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub workflow: WorkflowFile,
}

pub async fn workflow_generate(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let generated = state
        .agent_manager
        .generate_workflow(&auth.user, &auth.user.id, body.workflow_id.as_deref(), &body.raw_user_message)
        .await?;
    let saved = state
        .storage
        .save_workflow(&auth.user.id, &generated.workflow_name, &generated.content)
        .await?;
    Ok(Json(GenerateResponse { workflow: saved }))
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub workflow_id: String,
    #[serde(default)]
    pub user_parameters: HashMap<String, Value>,
    #[serde(default)]
    pub user_timezone: Option<String>,
}

pub async fn workflow_execute(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<ExecuteRequest>,
) -> Result<Json<Value>, ApiError> {
    let file = state.storage.get_workflow(&auth.user.id, &body.workflow_id).await?;
    let plan = state
        .engine
        .prepare(
            &file.content,
            &auth.user.id,
            &auth.user,
            &body.user_parameters,
            &auth.token,
            body.user_timezone.as_deref(),
        )
        .await?;
    let result = state.engine.execute(plan, &auth.token).await?;
    Ok(Json(serde_json::to_value(result).map_err(|e| bad_input(e.to_string()))?))
}

pub async fn list_workflows(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<Json<Vec<WorkflowFile>>, ApiError> {
    let workflows = state.storage.list_user_workflows(&auth.user.id).await?;
    Ok(Json(workflows))
}

pub async fn get_workflow(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<WorkflowFile>, ApiError> {
    let workflow = state.storage.get_workflow(&auth.user.id, &id).await?;
    Ok(Json(workflow))
}

#[derive(Debug, Deserialize)]
pub struct StoreTokenRequest {
    pub email: String,
    pub access_token: String,
}

pub async fn store_google_token(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<StoreTokenRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .tokens
        .store_google_token(&auth.user.id, &body.email, &body.access_token)
        .await?;
    Ok(Json(json!({ "stored": true })))
}

pub async fn token_info(State(state): State<Arc<AppState>>, auth: AuthContext) -> Result<Json<Value>, ApiError> {
    let info = state.tokens.get_token_info(&auth.user.id).await?;
    Ok(Json(serde_json::to_value(info).map_err(|e| bad_input(e.to_string()))?))
}

pub async fn validate_catalog(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
) -> Result<Json<Value>, ApiError> {
    let catalog = state.agent_manager.get_catalog().await?;
    let service_count = catalog.services.len();
    let action_count: usize = catalog.services.iter().map(|(_, schema)| schema.actions.len()).sum();
    Ok(Json(json!({
        "services": service_count,
        "actions": action_count,
        "catalog": catalog,
    })))
}
