//! ABOUTME: Execution Engine (C9) — prepares a validated, topologically ordered
//! ABOUTME: plan from a declarative workflow document and executes it sequentially,
//! ABOUTME: fail-fast, against the catalog and MCP dispatch.

mod graph;
mod resolve;

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::{CatalogNormalizer, ExecutionEngine, McpClient, WorkflowParser, WorkflowStorage};
use flowcraft_core::types::{
    ArtifactKind, ExecutionMode, ExecutionPlan, ExecutionResult, ExecutionState, ResolvedStep,
    ServiceCatalog, StepResult, StepStatus, User,
};
use flowcraft_ir::DeclarativeWorkflowParser;
use resolve::ResolutionContext;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

/// Reference implementation of C9, backed by an injected MCP client,
/// catalog normalizer, and storage layer. Caches its own catalog snapshot
/// the same way the Agent Manager (C8) does, since `ExecutionEngine::prepare`
/// carries no catalog parameter.
pub struct DefaultExecutionEngine {
    mcp_client: Arc<dyn McpClient>,
    normalizer: Arc<dyn CatalogNormalizer>,
    storage: Arc<dyn WorkflowStorage>,
    parser: DeclarativeWorkflowParser,
    catalog_cache: RwLock<Option<ServiceCatalog>>,
}

impl DefaultExecutionEngine {
    pub fn new(mcp_client: Arc<dyn McpClient>, normalizer: Arc<dyn CatalogNormalizer>, storage: Arc<dyn WorkflowStorage>) -> Self {
        Self {
            mcp_client,
            normalizer,
            storage,
            parser: DeclarativeWorkflowParser::new(),
            catalog_cache: RwLock::new(None),
        }
    }

    async fn catalog(&self) -> Result<ServiceCatalog> {
        {
            let cached = self.catalog_cache.read().await;
            if let Some(catalog) = cached.as_ref() {
                return Ok(catalog.clone());
            }
        }
        let raw = self.mcp_client.get_service_catalog().await?;
        let catalog = self.normalizer.normalize(&raw);
        let mut cached = self.catalog_cache.write().await;
        *cached = Some(catalog.clone());
        Ok(catalog)
    }
}

#[async_trait]
impl ExecutionEngine for DefaultExecutionEngine {
    #[instrument(skip(self, content, user, user_parameters, token))]
    async fn prepare(
        &self,
        content: &str,
        user_id: &str,
        user: &User,
        user_parameters: &HashMap<String, serde_json::Value>,
        token: &str,
        user_timezone: Option<&str>,
    ) -> Result<ExecutionPlan> {
        let _ = (user_id, user, token);
        let document = self.parser.parse(content)?;
        let catalog = self.catalog().await?;

        let mut validation_errors = Vec::new();

        if document.execution_config.mode != ExecutionMode::Sequential {
            validation_errors.push("only sequential execution mode is supported by this engine".to_string());
        }

        let step_ids: Vec<String> = document.steps.iter().map(|s| s.id.clone()).collect();
        let edges = graph::build_edges(&document);

        for step in &document.steps {
            for dep in &step.depends_on {
                if document.step(dep).is_none() {
                    validation_errors.push(format!(
                        "step '{}' depends on unknown step '{dep}'",
                        step.id
                    ));
                }
            }
        }

        let order = if let Some(cycle) = graph::detect_cycle(&step_ids, &edges) {
            validation_errors.push(format!("dependency cycle detected: {}", cycle.join(" -> ")));
            step_ids.clone()
        } else {
            graph::topo_sort(&step_ids, &edges)
        };

        for (name, spec) in &document.user_parameters {
            if spec.required {
                let provided = user_parameters.get(name);
                if provided.is_none() || provided == Some(&serde_json::Value::Null) {
                    validation_errors.push(format!("required user parameter '{name}' was not supplied"));
                }
            }
        }

        let mut service_types: HashMap<String, String> = HashMap::new();
        let mut declared_outputs: HashMap<String, HashMap<String, serde_json::Value>> = HashMap::new();

        for step in &document.steps {
            let split = ServiceCatalog::split_action(&step.action);
            let (service_type, action_schema) = match split {
                Some((service, _)) => (service.to_string(), catalog.resolve_qualified(&step.action)),
                None => ("unknown".to_string(), None),
            };
            service_types.insert(step.id.clone(), service_type);

            let mut outputs: HashMap<String, serde_json::Value> = step
                .outputs
                .keys()
                .map(|field| (field.clone(), serde_json::Value::Null))
                .collect();

            match (split, action_schema) {
                (None, _) => {
                    validation_errors.push(format!("step '{}' has a malformed action '{}'", step.id, step.action));
                }
                (Some(_), None) => {
                    validation_errors.push(format!("step '{}' references unknown action '{}'", step.id, step.action));
                }
                (Some(_), Some(schema)) => {
                    for field in schema.required_field_names() {
                        if !step.parameters.contains_key(field) {
                            validation_errors.push(format!(
                                "step '{}' is missing required field '{field}' for action '{}'",
                                step.id, step.action
                            ));
                        }
                    }
                    for field in schema.output_schema.properties.keys() {
                        outputs.entry(field.clone()).or_insert(serde_json::Value::Null);
                    }
                }
            }

            declared_outputs.insert(step.id.clone(), outputs);
        }

        let environment = document.execution_config.environment.clone();
        let validation_context = ResolutionContext {
            user_parameters,
            step_outputs: &declared_outputs,
            environment: &environment,
            now: Utc::now(),
            user_timezone,
        };

        for step in &document.steps {
            validation_context.validate_step_parameters(&step.id, &step.parameters, &mut validation_errors);
        }

        let resolved_steps: Vec<ResolvedStep> = order
            .iter()
            .filter_map(|id| document.step(id))
            .map(|step| ResolvedStep {
                step: step.clone(),
                service_type: service_types.get(&step.id).cloned().unwrap_or_else(|| "unknown".to_string()),
            })
            .collect();

        info!(
            steps = resolved_steps.len(),
            errors = validation_errors.len(),
            "execution plan prepared"
        );

        Ok(ExecutionPlan {
            workflow_id: document.name.clone(),
            name: document.name,
            description: document.description,
            resolved_steps,
            validation_errors,
            user_parameters: user_parameters.clone(),
            environment,
            user_timezone: user_timezone.map(|s| s.to_string()),
        })
    }

    #[instrument(skip(self, plan, token))]
    async fn execute(&self, plan: ExecutionPlan, token: &str) -> Result<ExecutionResult> {
        if !plan.is_valid() {
            return Err(FlowError::validation(plan.validation_errors.clone()));
        }

        let mut steps = Vec::with_capacity(plan.resolved_steps.len());
        let mut step_outputs: HashMap<String, HashMap<String, serde_json::Value>> = HashMap::new();
        let mut failed_step_id = None;
        let mut log_lines = Vec::new();

        for resolved in &plan.resolved_steps {
            let context = ResolutionContext {
                user_parameters: &plan.user_parameters,
                step_outputs: &step_outputs,
                environment: &plan.environment,
                now: Utc::now(),
                user_timezone: plan.user_timezone.as_deref(),
            };

            let payload = match context.substitute(&serde_json::Value::Object(
                resolved.step.parameters.clone().into_iter().collect(),
            )) {
                Ok(value) => value,
                Err(err) => {
                    warn!(step_id = %resolved.step.id, error = %err, "reference resolution failed at execute time");
                    steps.push(StepResult {
                        step_id: resolved.step.id.clone(),
                        status: StepStatus::Failed {
                            class: flowcraft_core::error::DispatchClass::Invalid,
                            message: err.to_string(),
                        },
                    });
                    failed_step_id = Some(resolved.step.id.clone());
                    break;
                }
            };

            let (service, action) = ServiceCatalog::split_action(&resolved.step.action)
                .unwrap_or(("unknown", resolved.step.action.as_str()));

            match self.mcp_client.call(service, action, token, payload).await {
                Ok(response) if response.success => {
                    let outputs: HashMap<String, serde_json::Value> = match response.data {
                        serde_json::Value::Object(map) => map.into_iter().collect(),
                        other => {
                            let mut single = HashMap::new();
                            single.insert("value".to_string(), other);
                            single
                        }
                    };
                    log_lines.push(format!("step '{}' completed", resolved.step.id));
                    step_outputs.insert(resolved.step.id.clone(), outputs.clone());
                    steps.push(StepResult {
                        step_id: resolved.step.id.clone(),
                        status: StepStatus::Completed { outputs },
                    });
                }
                Ok(response) => {
                    let error = response.error.unwrap_or(flowcraft_core::types::McpCallError {
                        class: flowcraft_core::error::DispatchClass::Server,
                        message: "dispatch reported failure with no error detail".to_string(),
                    });
                    log_lines.push(format!("step '{}' failed: {}", resolved.step.id, error.message));
                    steps.push(StepResult {
                        step_id: resolved.step.id.clone(),
                        status: StepStatus::Failed {
                            class: error.class,
                            message: error.message,
                        },
                    });
                    failed_step_id = Some(resolved.step.id.clone());
                    break;
                }
                Err(FlowError::Dispatch { class, message, .. }) => {
                    log_lines.push(format!("step '{}' failed: {message}", resolved.step.id));
                    steps.push(StepResult {
                        step_id: resolved.step.id.clone(),
                        status: StepStatus::Failed { class, message },
                    });
                    failed_step_id = Some(resolved.step.id.clone());
                    break;
                }
                Err(other) => return Err(other),
            }
        }

        let state = if failed_step_id.is_some() {
            ExecutionState::Failed
        } else {
            ExecutionState::Completed
        };

        if let Err(err) = self
            .storage
            .save_artifact(
                "system",
                &plan.workflow_id,
                ArtifactKind::ExecutionLog,
                "execution.log",
                &log_lines.join("\n"),
            )
            .await
        {
            warn!(error = %err, "failed to persist execution log artifact");
        }

        Ok(ExecutionResult {
            workflow_id: plan.workflow_id,
            state,
            steps,
            failed_step_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flowcraft_core::types::{ActionSchema, Field, MCPCatalog, McpCallResponse, OrderedMap, OutputField, OutputSchema, ServiceSchema, ServiceStatus};
    use flowcraft_storage::MemoryBackend;
    use std::sync::Mutex;

    const DOC: &str = r#"
        workflow: {
            version: "1.0"
            name: "send-and-log"
            description: "send an email then record it"
            steps: [
                {
                    id: "send"
                    name: "Send"
                    action: "gmail.send_message"
                    parameters: { to: "${user.recipient}", subject: "${user.subject}" }
                    outputs: { message_id: { type: "string" } }
                },
                {
                    id: "log"
                    name: "Log"
                    action: "sheets.append_row"
                    parameters: { row: "sent ${steps.send.outputs.message_id}" }
                    depends_on: ["send"]
                }
            ]
            user_parameters: {
                recipient: { type: "string", required: true }
                subject: { type: "string", required: true }
            }
            service_bindings: {}
            execution_config: { mode: sequential }
        }
    "#;

    fn catalog() -> ServiceCatalog {
        let mut gmail_actions = OrderedMap::new();
        gmail_actions.insert(
            "send_message".to_string(),
            ActionSchema {
                description: "send an email".to_string(),
                required_fields: vec![Field {
                    name: "to".to_string(),
                    ..Default::default()
                }],
                optional_fields: vec![Field {
                    name: "subject".to_string(),
                    ..Default::default()
                }],
                output_schema: OutputSchema {
                    properties: [(
                        "message_id".to_string(),
                        OutputField {
                            r#type: flowcraft_core::types::FieldType::String,
                            description: String::new(),
                        },
                    )]
                    .into_iter()
                    .collect(),
                    required: vec!["message_id".to_string()],
                },
            },
        );
        let mut sheets_actions = OrderedMap::new();
        sheets_actions.insert(
            "append_row".to_string(),
            ActionSchema {
                description: "append a row".to_string(),
                required_fields: vec![Field {
                    name: "row".to_string(),
                    ..Default::default()
                }],
                optional_fields: Vec::new(),
                output_schema: OutputSchema::default(),
            },
        );

        let mut services = OrderedMap::new();
        services.insert(
            "gmail".to_string(),
            ServiceSchema {
                status: ServiceStatus::Available,
                actions: gmail_actions,
            },
        );
        services.insert(
            "sheets".to_string(),
            ServiceSchema {
                status: ServiceStatus::Available,
                actions: sheets_actions,
            },
        );
        ServiceCatalog { services }
    }

    struct StubMcpClient {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl McpClient for StubMcpClient {
        async fn get_service_catalog(&self) -> Result<MCPCatalog> {
            Ok(MCPCatalog { services: Vec::new() })
        }

        async fn call(&self, service: &str, action: &str, _token: &str, payload: serde_json::Value) -> Result<McpCallResponse> {
            self.calls.lock().unwrap().push((service.to_string(), action.to_string()));
            match (service, action) {
                ("gmail", "send_message") => Ok(McpCallResponse {
                    success: true,
                    data: serde_json::json!({"message_id": "m-1"}),
                    error: None,
                }),
                ("sheets", "append_row") => {
                    assert_eq!(payload["row"], serde_json::json!("sent m-1"));
                    Ok(McpCallResponse {
                        success: true,
                        data: serde_json::json!({}),
                        error: None,
                    })
                }
                _ => panic!("unexpected dispatch {service}.{action}"),
            }
        }
    }

    struct PassthroughNormalizer(ServiceCatalog);

    impl CatalogNormalizer for PassthroughNormalizer {
        fn normalize(&self, _raw: &MCPCatalog) -> ServiceCatalog {
            self.0.clone()
        }
        fn render_available_services(&self, _catalog: &ServiceCatalog, _only: Option<&[String]>) -> String {
            String::new()
        }
    }

    fn engine() -> DefaultExecutionEngine {
        DefaultExecutionEngine::new(
            Arc::new(StubMcpClient {
                calls: Mutex::new(Vec::new()),
            }),
            Arc::new(PassthroughNormalizer(catalog())),
            Arc::new(MemoryBackend::new()),
        )
    }

    fn user_parameters() -> HashMap<String, serde_json::Value> {
        let mut params = HashMap::new();
        params.insert("recipient".to_string(), serde_json::json!("a@example.com"));
        params.insert("subject".to_string(), serde_json::json!("hello"));
        params
    }

    #[tokio::test]
    async fn prepares_a_valid_two_step_plan_in_dependency_order() {
        let engine = engine();
        let user = User::new("u1", "u1@example.com", "U1");
        let plan = engine
            .prepare(DOC, "u1", &user, &user_parameters(), "tok", None)
            .await
            .unwrap();

        assert!(plan.is_valid(), "{:?}", plan.validation_errors);
        let ids: Vec<&str> = plan.resolved_steps.iter().map(|s| s.step.id.as_str()).collect();
        assert_eq!(ids, vec!["send", "log"]);
    }

    #[tokio::test]
    async fn executes_sequentially_and_propagates_step_output() {
        let engine = engine();
        let user = User::new("u1", "u1@example.com", "U1");
        let plan = engine
            .prepare(DOC, "u1", &user, &user_parameters(), "tok", None)
            .await
            .unwrap();

        let result = engine.execute(plan, "tok").await.unwrap();
        assert_eq!(result.state, ExecutionState::Completed);
        assert_eq!(result.steps.len(), 2);
    }

    #[tokio::test]
    async fn prepare_reports_missing_required_user_parameter() {
        let engine = engine();
        let user = User::new("u1", "u1@example.com", "U1");
        let plan = engine.prepare(DOC, "u1", &user, &HashMap::new(), "tok", None).await.unwrap();
        assert!(!plan.is_valid());
        assert!(plan.validation_errors.iter().any(|e| e.contains("recipient")));
    }

    #[tokio::test]
    async fn execute_refuses_an_invalid_plan() {
        let engine = engine();
        let user = User::new("u1", "u1@example.com", "U1");
        let plan = engine.prepare(DOC, "u1", &user, &HashMap::new(), "tok", None).await.unwrap();
        let result = engine.execute(plan, "tok").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn prepare_reports_unknown_action() {
        let doc = DOC.replace("gmail.send_message", "unknown_service.send_message");
        let engine = engine();
        let user = User::new("u1", "u1@example.com", "U1");
        let plan = engine.prepare(&doc, "u1", &user, &user_parameters(), "tok", None).await.unwrap();
        assert!(!plan.is_valid());
        assert!(plan.validation_errors.iter().any(|e| e.contains("unknown action")));
    }

    const CYCLE_DOC: &str = r#"
        workflow: {
            version: "1.0"
            name: "cyclic"
            description: "two steps depending on each other"
            steps: [
                {
                    id: "a"
                    name: "A"
                    action: "gmail.send_message"
                    parameters: { to: "${user.recipient}" }
                    depends_on: ["b"]
                },
                {
                    id: "b"
                    name: "B"
                    action: "sheets.append_row"
                    parameters: { row: "x" }
                    depends_on: ["a"]
                }
            ]
            user_parameters: { recipient: { type: "string", required: true } }
            service_bindings: {}
            execution_config: { mode: sequential }
        }
    "#;

    #[tokio::test]
    async fn prepare_detects_a_dependency_cycle() {
        let engine = engine();
        let user = User::new("u1", "u1@example.com", "U1");
        let plan = engine
            .prepare(CYCLE_DOC, "u1", &user, &user_parameters(), "tok", None)
            .await
            .unwrap();
        assert!(!plan.is_valid());
        assert!(plan.validation_errors.iter().any(|e| e.contains("cycle")));
    }
}
