//! ABOUTME: Execution plan and result types produced by the preparation/execute phases

use super::catalog::FieldType;
use super::workflow::Step;
use crate::error::DispatchClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A step with its parameter references resolved against the preparation context,
/// ready for dispatch. `resolved_parameters` still contains reference tokens —
/// substitution to concrete values happens per-step at execute time so that
/// `${steps.*.outputs.*}` can observe a prior step's actual dispatch result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedStep {
    pub step: Step,
    pub service_type: String,
}

/// The prepared, validated, ordered form of a workflow, immutable after preparation.
///
/// Carries the resolution context (`user_parameters`, `environment`, `user_timezone`)
/// forward from preparation to execution, since `ExecutionEngine::execute` is handed
/// only the plan and a token — references are substituted at dispatch time, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub workflow_id: String,
    pub name: String,
    pub description: String,
    pub resolved_steps: Vec<ResolvedStep>,
    pub validation_errors: Vec<String>,
    pub user_parameters: HashMap<String, serde_json::Value>,
    pub environment: HashMap<String, String>,
    pub user_timezone: Option<String>,
}

impl ExecutionPlan {
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// Status of a single step after execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Completed {
        outputs: HashMap<String, serde_json::Value>,
    },
    Failed {
        class: DispatchClass,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub status: StepStatus,
}

/// Overall execution state machine: `pending -> running -> (completed | failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub workflow_id: String,
    pub state: ExecutionState,
    pub steps: Vec<StepResult>,
    /// Set when `state == Failed`; the id of the step that stopped execution.
    pub failed_step_id: Option<String>,
}

/// Helper used when inferring a field's `FieldType` from an example payload
/// (Catalog Normalizer inference rule).
pub fn infer_field_type(example: &serde_json::Value) -> FieldType {
    match example {
        serde_json::Value::String(_) => FieldType::String,
        serde_json::Value::Bool(_) => FieldType::Boolean,
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                FieldType::Integer
            } else {
                FieldType::Number
            }
        }
        serde_json::Value::Array(_) => FieldType::Array,
        serde_json::Value::Object(_) => FieldType::Object,
        serde_json::Value::Null => FieldType::String,
    }
}
