//! ABOUTME: Raw, un-normalized MCP catalog and call types — the wire shape C1 returns
//! ABOUTME: and C2 consumes; kept separate from the normalized ServiceCatalog

use crate::error::DispatchClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One field as MCP describes it, before type inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

/// Raw output property declaration as MCP reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOutputProperty {
    pub r#type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawOutputSchema {
    #[serde(default)]
    pub properties: HashMap<String, RawOutputProperty>,
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAction {
    pub description: String,
    #[serde(default)]
    pub fields: Vec<RawField>,
    /// Representative example payload, used by the Catalog Normalizer to infer
    /// untyped-field types and to render `example_value`.
    #[serde(default)]
    pub example_payload: serde_json::Value,
    #[serde(default)]
    pub output_schema: Option<RawOutputSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawService {
    #[serde(default)]
    pub available: bool,
    /// Insertion order from the MCP response is preserved by `Vec`.
    pub actions: Vec<(String, RawAction)>,
}

/// The raw catalog as fetched from MCP, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MCPCatalog {
    pub services: Vec<(String, RawService)>,
}

/// Result of a single MCP action dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpCallResponse {
    pub success: bool,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub error: Option<McpCallError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpCallError {
    pub class: DispatchClass,
    pub message: String,
}
