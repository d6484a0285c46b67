//! ABOUTME: Cross-crate contracts — every component implements one of these
//! ABOUTME: traits so the pipeline and engine can be assembled by dependency injection

use crate::error::Result;
use crate::types::{
    ExecutionPlan, ExecutionResult, MCPCatalog, McpCallResponse, ServiceCatalog, User, UserId,
    WorkflowDocument, WorkflowFile,
};
use async_trait::async_trait;
use std::collections::HashMap;

/// C1 — MCP Client. Unaware of workflow semantics; a thin typed transport.
#[async_trait]
pub trait McpClient: Send + Sync {
    async fn get_service_catalog(&self) -> Result<MCPCatalog>;

    async fn call(
        &self,
        service: &str,
        action: &str,
        token: &str,
        payload: serde_json::Value,
    ) -> Result<McpCallResponse>;
}

/// C2 — Catalog Normalizer.
pub trait CatalogNormalizer: Send + Sync {
    fn normalize(&self, raw: &MCPCatalog) -> ServiceCatalog;

    /// Render the stable `available_services` prompt string for a catalog,
    /// optionally filtered to a subset of services (the user's capabilities view).
    fn render_available_services(&self, catalog: &ServiceCatalog, only: Option<&[String]>) -> String;
}

/// C3 — Workflow Document Parser.
pub trait WorkflowParser: Send + Sync {
    /// Parse declarative text into IR. Parse errors never stop storage (the
    /// raw content is still retained) but do block execution preparation.
    fn parse(&self, text: &str) -> Result<WorkflowDocument>;
}

/// C4 — Storage Layer, pluggable across filesystem / object store / in-memory.
#[async_trait]
pub trait WorkflowStorage: Send + Sync {
    async fn save_workflow(&self, user_id: &str, name: &str, content: &str) -> Result<WorkflowFile>;
    async fn get_workflow(&self, user_id: &str, id: &str) -> Result<WorkflowFile>;
    async fn list_user_workflows(&self, user_id: &str) -> Result<Vec<WorkflowFile>>;
    async fn delete_workflow(&self, user_id: &str, id: &str) -> Result<()>;

    async fn save_artifact(
        &self,
        user_id: &str,
        workflow_id: &str,
        kind: crate::types::ArtifactKind,
        filename: &str,
        content: &str,
    ) -> Result<()>;
}

/// C5 — Token Manager.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn store_google_token(&self, user_id: &str, email: &str, access_token: &str) -> Result<()>;
    async fn get_google_token(&self, user_id: &str) -> Result<String>;
    async fn get_token_info(&self, user_id: &str) -> Result<TokenInfo>;
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenInfo {
    pub user_id: String,
    pub email: String,
    pub issued_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// C6 — Agent Runtime: renders a prompt, invokes the LLM, validates structured output.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// `inputs` is the rendered template context; the returned JSON is validated
    /// against a caller-supplied JSON Schema before being handed back.
    async fn run(
        &self,
        user_id: &str,
        template: &str,
        inputs: &HashMap<String, serde_json::Value>,
        output_schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// C9 — Execution Engine.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn prepare(
        &self,
        content: &str,
        user_id: &str,
        user: &User,
        user_parameters: &HashMap<String, serde_json::Value>,
        token: &str,
        user_timezone: Option<&str>,
    ) -> Result<ExecutionPlan>;

    async fn execute(&self, plan: ExecutionPlan, token: &str) -> Result<ExecutionResult>;
}

/// Identifies the current user at the HTTP boundary (out of scope beyond this contract —
/// the identity provider performs the actual authentication).
#[async_trait]
pub trait IdentityBoundary: Send + Sync {
    async fn authenticate(&self, bearer_token: &str) -> Result<(User, UserId)>;
}
