//! ABOUTME: Workflow document (IR) types — steps, parameters, service bindings
//! ABOUTME: This is the canonical declarative representation parsed by flowcraft-ir

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A parameter value: either a concrete JSON value or a `${...}` reference token.
pub type ParameterValue = serde_json::Value;

/// Declared expectation for a user-supplied parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserParameterSpec {
    pub r#type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub validation: Option<String>,
}

/// Declared output of a step, matching the catalog action's output schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutputSpec {
    pub r#type: String,
    #[serde(default)]
    pub description: String,
}

/// A single catalog-action invocation within a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub name: String,
    /// Qualified action name, `service.action`.
    pub action: String,
    #[serde(default)]
    pub parameters: HashMap<String, ParameterValue>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub outputs: HashMap<String, StepOutputSpec>,
}

/// `{type: "mcp_service", provider, auth}` binding for one service a workflow uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBinding {
    pub r#type: String,
    pub provider: String,
    pub auth: ServiceAuth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAuth {
    pub method: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub token_source: String,
}

/// Execution mode. Only `Sequential` is accepted by this engine; anything
/// else is rejected at preparation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub environment: HashMap<String, String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            timeout: None,
            environment: HashMap::new(),
        }
    }
}

/// Canonical workflow intermediate representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub original_intent: Option<String>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub user_parameters: HashMap<String, UserParameterSpec>,
    #[serde(default)]
    pub service_bindings: HashMap<String, ServiceBinding>,
    #[serde(default)]
    pub execution_config: ExecutionConfig,
}

impl WorkflowDocument {
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }
}
