//! ABOUTME: Normalized service catalog types — the single source of truth
//! ABOUTME: consumed by every downstream stage (agents, parser, engine)

use super::ordered_map::OrderedMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inferred or declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl Default for FieldType {
    fn default() -> Self {
        Self::String
    }
}

/// A single input or output field on an action.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub r#type: FieldType,
    #[serde(default)]
    pub placeholder_type: Option<String>,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default)]
    pub example_value: Option<serde_json::Value>,
    #[serde(default)]
    pub description: String,
}

/// An output field declaration, as carried by the authoritative output schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputField {
    pub r#type: FieldType,
    #[serde(default)]
    pub description: String,
}

/// Output schema for an action: `properties` plus which of them are `required`.
///
/// Authoritative for every `${steps.*.outputs.*}` reference in a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSchema {
    pub properties: HashMap<String, OutputField>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl OutputSchema {
    pub fn declares(&self, field: &str) -> bool {
        self.properties.contains_key(field)
    }
}

/// A single catalog action (e.g. `gmail.send_message`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSchema {
    pub description: String,
    #[serde(default)]
    pub required_fields: Vec<Field>,
    #[serde(default)]
    pub optional_fields: Vec<Field>,
    #[serde(default)]
    pub output_schema: OutputSchema,
}

impl ActionSchema {
    pub fn required_field_names(&self) -> impl Iterator<Item = &str> {
        self.required_fields.iter().map(|f| f.name.as_str())
    }

    pub fn all_field_names(&self) -> impl Iterator<Item = &str> {
        self.required_fields
            .iter()
            .chain(self.optional_fields.iter())
            .map(|f| f.name.as_str())
    }
}

/// Availability of a service within the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Available,
    Degraded,
    Unavailable,
}

/// All actions exposed by one MCP-backed service (e.g. `gmail`, `docs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSchema {
    pub status: ServiceStatus,
    /// Insertion-ordered so `available_services` rendering is deterministic;
    /// callers must not rely on `HashMap` iteration order for that string.
    pub actions: OrderedMap<ActionSchema>,
}

/// The normalized, typed catalog: `service_name -> ServiceSchema`.
///
/// Loaded once at startup, cached, and replaced only via an explicit
/// reload (never partially mutated).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceCatalog {
    pub services: OrderedMap<ServiceSchema>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `service.action` against the catalog. Every downstream stage
    /// (agents, parser, engine) must route through this to preserve catalog closure.
    pub fn resolve(&self, service: &str, action: &str) -> Option<&ActionSchema> {
        self.services.get(service)?.actions.get(action)
    }

    /// Split a qualified action name `service.action` into its parts.
    pub fn split_action(qualified: &str) -> Option<(&str, &str)> {
        qualified.split_once('.')
    }

    pub fn resolve_qualified(&self, qualified: &str) -> Option<&ActionSchema> {
        let (service, action) = Self::split_action(qualified)?;
        self.resolve(service, action)
    }
}
