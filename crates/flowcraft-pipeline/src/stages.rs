//! ABOUTME: The three Agent Pipeline stages (C7) — each a single AgentRuntime
//! ABOUTME: call with a typed input/output pair, persisting prompt+response
//! ABOUTME: artifacts the way C6's contract describes.

use crate::schemas::{generated_workflow_schema, structured_intent_schema, validated_intent_schema};
use crate::types::{
    GeneratedWorkflow, IntentAnalystInput, IntentGathererInput, StructuredIntent, ValidatedIntent,
    WorkflowGeneratorInput,
};
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::{AgentRuntime, WorkflowStorage};
use flowcraft_core::types::ArtifactKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

const INTENT_GATHERER_TEMPLATE: &str = "\
You are the Intent Gatherer. Given the user's message and conversation so far, \
produce a structured intent describing the workflow pattern, trigger conditions, \
and candidate action sequence. Ask for clarification if the request is ambiguous.

User message: {{user_message}}
Discovery phase: {{discovery_phase}}
Collected intent so far: {{collected_intent}}

Respond with JSON only, matching: \
{\"workflow_pattern\": string, \"trigger_conditions\": [string], \"action_sequence\": [string], \
\"needs_clarification\": bool, \"clarification_question\": string|null}.";

const INTENT_ANALYST_TEMPLATE: &str = "\
You are the Intent Analyst. Validate the structured intent against the user's \
connected capabilities and the available service schemas. Reject any action \
whose required service is not among the user's capabilities by omitting it \
from required_services.

Structured intent: {{structured_intent}}
User capabilities: {{user_capabilities}}
Service schemas: {{service_schemas}}

Respond with JSON only, matching: \
{\"required_services\": [string], \"parameter_expectations\": object, \
\"normalized_action_sequence\": [string]}.";

const WORKFLOW_GENERATOR_TEMPLATE: &str = "\
You are the Workflow Generator. Produce a declarative workflow document using \
only the actions and outputs listed in the available services. Every step's \
parameters and output references must resolve against that catalog.

Raw user intent: {{raw_user_intent}}
Validated intent: {{validated_intent}}
Available services:
{{available_services}}

Respond with JSON only, matching: \
{\"workflow_name\": string, \"content\": string, \"storage_location\": string|null}.";

async fn run_stage<I: serde::Serialize, O: serde::de::DeserializeOwned>(
    runtime: &dyn AgentRuntime,
    user_id: &str,
    template: &str,
    input: &I,
    output_schema: &serde_json::Value,
) -> Result<O> {
    let input_map: HashMap<String, serde_json::Value> = match serde_json::to_value(input)
        .map_err(|e| FlowError::internal(format!("stage input is not serializable: {e}")))?
    {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        other => {
            let mut map = HashMap::new();
            map.insert("input".to_string(), other);
            map
        }
    };

    let output = runtime.run(user_id, template, &input_map, output_schema).await?;
    serde_json::from_value(output)
        .map_err(|e| FlowError::Agent {
            message: format!("stage output did not match the expected shape: {e}"),
        })
}

/// Persists the rendered prompt and the raw response text under the
/// triggering user/workflow, as C6's contract requires. Stages compute the
/// same rendering flowcraft_llm::render_template performs internally so the
/// artifact matches exactly what was sent to the provider.
async fn persist_artifacts(
    storage: &dyn WorkflowStorage,
    user_id: &str,
    workflow_id: &str,
    stage_name: &str,
    prompt: &str,
    response: &str,
) {
    let prompt_result = storage
        .save_artifact(user_id, workflow_id, ArtifactKind::Prompt, &format!("{stage_name}.txt"), prompt)
        .await;
    if let Err(e) = prompt_result {
        tracing::warn!(stage = stage_name, error = %e, "failed to persist prompt artifact");
    }

    let response_result = storage
        .save_artifact(user_id, workflow_id, ArtifactKind::Response, &format!("{stage_name}.json"), response)
        .await;
    if let Err(e) = response_result {
        tracing::warn!(stage = stage_name, error = %e, "failed to persist response artifact");
    }
}

#[instrument(skip(runtime, storage, input))]
pub async fn run_intent_gatherer(
    runtime: &dyn AgentRuntime,
    storage: Option<(&dyn WorkflowStorage, &str)>,
    user_id: &str,
    input: IntentGathererInput,
) -> Result<StructuredIntent> {
    let prompt = flowcraft_llm::render_template(INTENT_GATHERER_TEMPLATE, &serde_json::to_value(&input).unwrap());
    let result: StructuredIntent =
        run_stage(runtime, user_id, INTENT_GATHERER_TEMPLATE, &input, &structured_intent_schema()).await?;

    if let Some((storage, workflow_id)) = storage {
        let response = serde_json::to_string_pretty(&result).unwrap_or_default();
        persist_artifacts(storage, user_id, workflow_id, "intent_gatherer", &prompt, &response).await;
    }
    Ok(result)
}

#[instrument(skip(runtime, storage, input))]
pub async fn run_intent_analyst(
    runtime: &dyn AgentRuntime,
    storage: Option<(&dyn WorkflowStorage, &str)>,
    user_id: &str,
    input: IntentAnalystInput,
) -> Result<ValidatedIntent> {
    let prompt = flowcraft_llm::render_template(INTENT_ANALYST_TEMPLATE, &serde_json::to_value(&input).unwrap());
    let result: ValidatedIntent =
        run_stage(runtime, user_id, INTENT_ANALYST_TEMPLATE, &input, &validated_intent_schema()).await?;

    if result.required_services.is_empty() {
        warn!(user_id, "intent analyst returned no required_services; relying on generator-side catalog closure");
    }

    if let Some((storage, workflow_id)) = storage {
        let response = serde_json::to_string_pretty(&result).unwrap_or_default();
        persist_artifacts(storage, user_id, workflow_id, "intent_analyst", &prompt, &response).await;
    }
    Ok(result)
}

#[instrument(skip(runtime, storage, input))]
pub async fn run_workflow_generator(
    runtime: &dyn AgentRuntime,
    storage: Option<(&dyn WorkflowStorage, &str)>,
    user_id: &str,
    input: WorkflowGeneratorInput,
) -> Result<GeneratedWorkflow> {
    let prompt = flowcraft_llm::render_template(WORKFLOW_GENERATOR_TEMPLATE, &serde_json::to_value(&input).unwrap());
    let result: GeneratedWorkflow =
        run_stage(runtime, user_id, WORKFLOW_GENERATOR_TEMPLATE, &input, &generated_workflow_schema()).await?;

    if let Some((storage, workflow_id)) = storage {
        let response = serde_json::to_string_pretty(&result).unwrap_or_default();
        persist_artifacts(storage, user_id, workflow_id, "workflow_generator", &prompt, &response).await;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flowcraft_storage::MemoryBackend;
    use serde_json::json;

    struct StubRuntime {
        response: serde_json::Value,
    }

    #[async_trait]
    impl AgentRuntime for StubRuntime {
        async fn run(
            &self,
            _user_id: &str,
            _template: &str,
            _inputs: &HashMap<String, serde_json::Value>,
            _output_schema: &serde_json::Value,
        ) -> Result<serde_json::Value> {
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn intent_gatherer_parses_into_typed_output() {
        let runtime = StubRuntime {
            response: json!({
                "workflow_pattern": "send_email",
                "trigger_conditions": [],
                "action_sequence": ["gmail.send_message"],
                "needs_clarification": false,
                "clarification_question": null
            }),
        };
        let input = IntentGathererInput {
            user_message: "send an email".to_string(),
            conversation_history: vec![],
            discovery_phase: "initial".to_string(),
            collected_intent: json!({}),
        };

        let result = run_intent_gatherer(&runtime, None, "u1", input).await.unwrap();
        assert_eq!(result.workflow_pattern, "send_email");
    }

    #[tokio::test]
    async fn persists_prompt_and_response_artifacts_when_storage_is_given() {
        let runtime = StubRuntime {
            response: json!({
                "workflow_pattern": "send_email",
                "trigger_conditions": [],
                "action_sequence": [],
                "needs_clarification": false,
                "clarification_question": null
            }),
        };
        let storage = MemoryBackend::new();
        let saved = storage.save_workflow("u1", "flow", "content").await.unwrap();

        let input = IntentGathererInput {
            user_message: "send an email".to_string(),
            conversation_history: vec![],
            discovery_phase: "initial".to_string(),
            collected_intent: json!({}),
        };

        run_intent_gatherer(&runtime, Some((&storage, &saved.id)), "u1", input)
            .await
            .unwrap();
    }
}
