//! ABOUTME: Catalog Normalizer (C2) — raw MCP catalog -> typed ServiceCatalog,
//! ABOUTME: plus the deterministic `available_services` prompt rendering

use flowcraft_core::traits::CatalogNormalizer;
use flowcraft_core::types::execution::infer_field_type;
use flowcraft_core::types::{
    ActionSchema, Field, MCPCatalog, OutputField, OutputSchema, RawAction, RawService,
    ServiceCatalog, ServiceSchema, ServiceStatus,
};
use std::fmt::Write as _;

/// Default normalizer: infers missing field types from `example_payload` and
/// renders a stable `available_services` description for agent prompts.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCatalogNormalizer;

impl DefaultCatalogNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn normalize_action(action: &RawAction) -> ActionSchema {
        let example = &action.example_payload;

        let mut required_fields = Vec::new();
        let mut optional_fields = Vec::new();

        for field in &action.fields {
            let example_value = example.get(&field.name).cloned();
            let inferred = field
                .r#type
                .as_deref()
                .and_then(parse_field_type)
                .or_else(|| example_value.as_ref().map(infer_field_type))
                .unwrap_or_default();

            let normalized = Field {
                name: field.name.clone(),
                r#type: inferred,
                placeholder_type: field.r#type.clone(),
                validation_rules: Vec::new(),
                example_value,
                description: field.description.clone(),
            };

            if field.required {
                required_fields.push(normalized);
            } else {
                optional_fields.push(normalized);
            }
        }

        let output_schema = action
            .output_schema
            .as_ref()
            .map(|raw| OutputSchema {
                properties: raw
                    .properties
                    .iter()
                    .map(|(name, prop)| {
                        (
                            name.clone(),
                            OutputField {
                                r#type: parse_field_type(&prop.r#type).unwrap_or_default(),
                                description: prop.description.clone(),
                            },
                        )
                    })
                    .collect(),
                required: raw.required.clone(),
            })
            .unwrap_or_default();

        ActionSchema {
            description: action.description.clone(),
            required_fields,
            optional_fields,
            output_schema,
        }
    }

    fn normalize_service(raw: &RawService) -> ServiceSchema {
        let mut actions = flowcraft_core::types::OrderedMap::new();
        for (name, action) in &raw.actions {
            actions.insert(name.clone(), Self::normalize_action(action));
        }
        ServiceSchema {
            status: if raw.available {
                ServiceStatus::Available
            } else {
                ServiceStatus::Unavailable
            },
            actions,
        }
    }
}

/// Per the inference rule: string->string, integer->integer, float->number,
/// boolean->boolean, array->array, object->object; default string.
fn parse_field_type(declared: &str) -> Option<flowcraft_core::types::FieldType> {
    use flowcraft_core::types::FieldType;
    match declared {
        "string" => Some(FieldType::String),
        "integer" => Some(FieldType::Integer),
        "number" | "float" => Some(FieldType::Number),
        "boolean" => Some(FieldType::Boolean),
        "array" => Some(FieldType::Array),
        "object" => Some(FieldType::Object),
        _ => None,
    }
}

impl CatalogNormalizer for DefaultCatalogNormalizer {
    fn normalize(&self, raw: &MCPCatalog) -> ServiceCatalog {
        let mut services = flowcraft_core::types::OrderedMap::new();
        for (name, raw_service) in &raw.services {
            services.insert(name.clone(), Self::normalize_service(raw_service));
        }
        ServiceCatalog { services }
    }

    fn render_available_services(
        &self,
        catalog: &ServiceCatalog,
        only: Option<&[String]>,
    ) -> String {
        let mut out = String::new();
        for (service_name, schema) in catalog.services.iter() {
            if let Some(allowed) = only {
                if !allowed.iter().any(|s| s == service_name) {
                    continue;
                }
            }

            let description = schema
                .actions
                .iter()
                .next()
                .map(|(_, a)| a.description.as_str())
                .unwrap_or("");
            let _ = write!(out, "{service_name}: {description} (");

            let mut first = true;
            for (action_name, action) in schema.actions.iter() {
                if !first {
                    out.push_str("; ");
                }
                first = false;

                let required: Vec<&str> = action.required_field_names().collect();
                let all: Vec<&str> = action.all_field_names().collect();

                let _ = write!(out, "{action_name}(");
                if !required.is_empty() {
                    let _ = write!(out, "required: {}", required.join(", "));
                }
                if !all.is_empty() {
                    if !required.is_empty() {
                        out.push(' ');
                    }
                    let _ = write!(out, "[params: {}]", all.join(", "));
                }
                out.push(')');

                if !action.output_schema.properties.is_empty() {
                    let mut names: Vec<&str> =
                        action.output_schema.properties.keys().map(String::as_str).collect();
                    names.sort();
                    let _ = write!(out, " \u{2192} outputs: {}", names.join(", "));
                }
            }
            out.push_str(")\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcraft_core::types::{RawField, RawOutputProperty, RawOutputSchema};
    use std::collections::HashMap;

    fn sample_catalog() -> MCPCatalog {
        let action = RawAction {
            description: "Send an email".to_string(),
            fields: vec![
                RawField {
                    name: "to".to_string(),
                    r#type: None,
                    description: String::new(),
                    required: true,
                },
                RawField {
                    name: "subject".to_string(),
                    r#type: None,
                    description: String::new(),
                    required: true,
                },
            ],
            example_payload: serde_json::json!({"to": "a@b.com", "subject": "hi"}),
            output_schema: Some(RawOutputSchema {
                properties: HashMap::from([(
                    "message_id".to_string(),
                    RawOutputProperty {
                        r#type: "string".to_string(),
                        description: "sent message id".to_string(),
                    },
                )]),
                required: vec!["message_id".to_string()],
            }),
        };

        MCPCatalog {
            services: vec![(
                "gmail".to_string(),
                RawService {
                    available: true,
                    actions: vec![("send_message".to_string(), action)],
                },
            )],
        }
    }

    #[test]
    fn infers_types_from_example_payload() {
        let normalizer = DefaultCatalogNormalizer::new();
        let catalog = normalizer.normalize(&sample_catalog());
        let action = catalog.resolve("gmail", "send_message").unwrap();
        assert_eq!(action.required_fields.len(), 2);
        assert_eq!(
            action.required_fields[0].r#type,
            flowcraft_core::types::FieldType::String
        );
    }

    #[test]
    fn renders_with_outputs() {
        let normalizer = DefaultCatalogNormalizer::new();
        let catalog = normalizer.normalize(&sample_catalog());
        let rendered = normalizer.render_available_services(&catalog, None);
        assert!(rendered.contains("gmail: Send an email"));
        assert!(rendered.contains("required: to, subject"));
        assert!(rendered.contains("outputs: message_id"));
    }

    #[test]
    fn renders_without_outputs_when_catalog_omits_them() {
        let mut raw = sample_catalog();
        raw.services[0].1.actions[0].1.output_schema = None;
        let normalizer = DefaultCatalogNormalizer::new();
        let catalog = normalizer.normalize(&raw);
        let rendered = normalizer.render_available_services(&catalog, None);
        assert!(!rendered.contains("outputs:"));
    }

    #[test]
    fn rendering_is_a_pure_function_of_the_catalog() {
        let normalizer = DefaultCatalogNormalizer::new();
        let catalog = normalizer.normalize(&sample_catalog());
        let a = normalizer.render_available_services(&catalog, None);
        let b = normalizer.render_available_services(&catalog, None);
        assert_eq!(a, b);
    }
}
