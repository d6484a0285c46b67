//! ABOUTME: Typed input/output records for each Agent Pipeline stage —
//! ABOUTME: the "input bag" the Agent Runtime accepts is always one of these, flattened.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct IntentGathererInput {
    pub user_message: String,
    pub conversation_history: Vec<String>,
    pub discovery_phase: String,
    pub collected_intent: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredIntent {
    pub workflow_pattern: String,
    pub trigger_conditions: Vec<String>,
    pub action_sequence: Vec<String>,
    #[serde(default)]
    pub needs_clarification: bool,
    #[serde(default)]
    pub clarification_question: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntentAnalystInput {
    pub structured_intent: StructuredIntent,
    pub user_capabilities: Value,
    pub service_schemas: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedIntent {
    #[serde(default)]
    pub required_services: Vec<String>,
    pub parameter_expectations: Value,
    pub normalized_action_sequence: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowGeneratorInput {
    pub raw_user_intent: String,
    pub validated_intent: ValidatedIntent,
    pub service_schemas: Value,
    pub available_services: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedWorkflow {
    pub workflow_name: String,
    pub content: String,
    #[serde(default)]
    pub storage_location: Option<String>,
}
