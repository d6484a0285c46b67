//! ABOUTME: HTTP surface (C8/C9 front door) — axum router, error mapping, and
//! ABOUTME: the bearer-token extractor every `/api/v1` handler shares

mod auth;
mod error;
mod handlers;
mod startup;

pub use auth::BearerIdentityBoundary;
pub use error::ApiError;
pub use startup::{build_state, serve};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::Router;
use flowcraft_core::error::FlowError;
use flowcraft_core::traits::{AgentRuntime, ExecutionEngine, IdentityBoundary, TokenStore, WorkflowStorage};
use flowcraft_core::types::User;
use flowcraft_orchestrator::AgentManager;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub struct AppState {
    pub agent_manager: Arc<AgentManager>,
    pub agent_runtime: Arc<dyn AgentRuntime>,
    pub engine: Arc<dyn ExecutionEngine>,
    pub storage: Arc<dyn WorkflowStorage>,
    pub tokens: Arc<dyn TokenStore>,
    pub identity: Arc<dyn IdentityBoundary>,
}

/// The authenticated caller plus the raw bearer token, extracted once per
/// request so handlers never re-parse the `Authorization` header.
pub struct AuthContext {
    pub user: User,
    pub token: String,
}

#[async_trait::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| FlowError::Unauthorized {
                message: "missing Authorization header".to_string(),
            })?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).to_string();
        let (user, _user_id) = state.identity.authenticate(&token).await?;
        Ok(AuthContext { user, token })
    }
}

#[derive(OpenApi)]
#[openapi()]
struct ApiDoc;

/// Builds the full router: `/health` unauthenticated, every `/api/v1/*` route
/// behind `AuthContext`, plus `/swagger-ui` for the generated OpenAPI document.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/capabilities", get(handlers::capabilities))
        .route("/api/v1/workflow/discover", post(handlers::workflow_discover))
        .route("/api/v1/workflow/continue", post(handlers::workflow_continue))
        .route("/api/v1/intent/analyze", post(handlers::intent_analyze))
        .route("/api/v1/workflow/generate", post(handlers::workflow_generate))
        .route("/api/v1/workflow/execute", post(handlers::workflow_execute))
        .route("/api/v1/workflows", get(handlers::list_workflows))
        .route("/api/v1/workflows/:id", get(handlers::get_workflow))
        .route("/api/v1/auth/store-google-token", post(handlers::store_google_token))
        .route("/api/v1/auth/token-info", get(handlers::token_info))
        .route("/api/v1/validate/catalog", get(handlers::validate_catalog))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn bad_input(message: impl Into<String>) -> ApiError {
    ApiError::from(FlowError::bad_input(message))
}
