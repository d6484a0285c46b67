//! ABOUTME: JSON Schemas the Agent Runtime validates each stage's output against.

use serde_json::{json, Value};

pub fn structured_intent_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "workflow_pattern": { "type": "string" },
            "trigger_conditions": { "type": "array", "items": { "type": "string" } },
            "action_sequence": { "type": "array", "items": { "type": "string" } },
            "needs_clarification": { "type": "boolean" },
            "clarification_question": { "type": ["string", "null"] }
        },
        "required": ["workflow_pattern", "trigger_conditions", "action_sequence"]
    })
}

pub fn validated_intent_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "required_services": { "type": "array", "items": { "type": "string" } },
            "parameter_expectations": { "type": "object" },
            "normalized_action_sequence": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["parameter_expectations", "normalized_action_sequence"]
    })
}

pub fn generated_workflow_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "workflow_name": { "type": "string" },
            "content": { "type": "string" },
            "storage_location": { "type": ["string", "null"] }
        },
        "required": ["workflow_name", "content"]
    })
}
