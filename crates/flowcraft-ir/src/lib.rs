//! ABOUTME: Workflow Document Parser (C3) — declarative text -> canonical IR

mod sanitizer;
mod value_parser;

use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::WorkflowParser;
use flowcraft_core::types::WorkflowDocument;

pub use sanitizer::sanitize;
pub use value_parser::{parse_document, ParseError};

/// Parses the declarative workflow document format: strips imports and
/// schema-conjunction prefixes, compiles the remainder to JSON, and promotes
/// a top-level `workflow` object to the root if present.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclarativeWorkflowParser;

impl DeclarativeWorkflowParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse to the intermediate JSON form without binding it to the typed
    /// IR. Used by the storage layer's parsing decorator, which only needs
    /// `parsed_data` as a JSON map and must not fail the save when the typed
    /// IR doesn't (yet) fully validate.
    pub fn parse_to_json(&self, text: &str) -> Result<serde_json::Value> {
        let sanitized = sanitize(text);
        let value = parse_document(&sanitized)
            .map_err(|e| FlowError::bad_input(format!("workflow document parse error: {e}")))?;

        Ok(promote_workflow_root(value))
    }
}

fn promote_workflow_root(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) => {
            if let Some(workflow) = map.remove("workflow") {
                workflow
            } else {
                serde_json::Value::Object(map)
            }
        }
        other => other,
    }
}

impl WorkflowParser for DeclarativeWorkflowParser {
    fn parse(&self, text: &str) -> Result<WorkflowDocument> {
        let json = self.parse_to_json(text)?;
        serde_json::from_value(json)
            .map_err(|e| FlowError::bad_input(format!("workflow document does not match the IR shape: {e}")))
    }
}
