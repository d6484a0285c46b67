//! ABOUTME: Agent Runtime (C6) — render, invoke, validate, repair-once.
//! ABOUTME: Grounded on llmspell-providers::ProviderInstance's complete() contract,
//! ABOUTME: narrowed to structured JSON output with a single repair retry.

use crate::provider::LlmProvider;
use crate::template;
use async_trait::async_trait;
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::AgentRuntime;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

const REPAIR_SYSTEM_MESSAGE: &str =
    "Your previous response did not match the required JSON schema. \
     Repair your previous output so it validates against the schema, returning only JSON.";

pub struct StructuredAgentRuntime {
    provider: Arc<dyn LlmProvider>,
}

impl StructuredAgentRuntime {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    fn parse_and_validate(&self, raw: &str, output_schema: &serde_json::Value) -> Result<serde_json::Value> {
        let parsed: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| FlowError::Agent {
                message: format!("LLM output was not valid JSON: {e}"),
            })?;

        let validator = jsonschema::JSONSchema::compile(output_schema).map_err(|e| {
            FlowError::internal(format!("output schema itself is not a valid JSON Schema: {e}"))
        })?;

        let issues: Option<Vec<String>> = match validator.validate(&parsed) {
            Ok(()) => None,
            Err(errors) => Some(errors.map(|e| e.to_string()).collect()),
        };

        match issues {
            None => Ok(parsed),
            Some(issues) => Err(FlowError::Agent {
                message: format!("LLM output failed schema validation: {}", issues.join("; ")),
            }),
        }
    }
}

#[async_trait]
impl AgentRuntime for StructuredAgentRuntime {
    #[instrument(skip(self, template, inputs, output_schema))]
    async fn run(
        &self,
        _user_id: &str,
        template: &str,
        inputs: &HashMap<String, serde_json::Value>,
        output_schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let input_bag = serde_json::to_value(inputs).unwrap_or(serde_json::Value::Null);
        let prompt = template::render(template, &input_bag);

        let raw = self.provider.complete(None, &prompt).await?;
        match self.parse_and_validate(&raw, output_schema) {
            Ok(value) => Ok(value),
            Err(first_error) => {
                warn!(error = %first_error, "agent output failed validation, attempting one repair");
                let repaired = self.provider.complete(Some(REPAIR_SYSTEM_MESSAGE), &prompt).await?;
                self.parse_and_validate(&repaired, output_schema)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct ScriptedProvider {
        responses: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, _system: Option<&str>, _prompt: &str) -> Result<String> {
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                Err(FlowError::Agent {
                    message: "no more scripted responses".to_string(),
                })
            } else {
                Ok(responses.remove(0))
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "ok": { "type": "boolean" } },
            "required": ["ok"]
        })
    }

    #[tokio::test]
    async fn returns_valid_json_on_first_attempt() {
        let provider = Arc::new(ScriptedProvider {
            responses: Mutex::new(vec!["{\"ok\": true}".to_string()]),
        });
        let runtime = StructuredAgentRuntime::new(provider);

        let result = runtime
            .run("u1", "template", &HashMap::new(), &schema())
            .await
            .unwrap();
        assert_eq!(result["ok"], true);
    }

    #[tokio::test]
    async fn repairs_once_after_invalid_first_response() {
        let provider = Arc::new(ScriptedProvider {
            responses: Mutex::new(vec![
                "not json at all".to_string(),
                "{\"ok\": false}".to_string(),
            ]),
        });
        let runtime = StructuredAgentRuntime::new(provider);

        let result = runtime
            .run("u1", "template", &HashMap::new(), &schema())
            .await
            .unwrap();
        assert_eq!(result["ok"], false);
    }

    #[tokio::test]
    async fn fails_after_repair_also_invalid() {
        let provider = Arc::new(ScriptedProvider {
            responses: Mutex::new(vec!["nope".to_string(), "still nope".to_string()]),
        });
        let runtime = StructuredAgentRuntime::new(provider);

        let result = runtime.run("u1", "template", &HashMap::new(), &schema()).await;
        assert!(matches!(result, Err(FlowError::Agent { .. })));
    }
}
