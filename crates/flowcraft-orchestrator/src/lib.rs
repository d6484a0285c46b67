//! ABOUTME: Agent Manager (C8) — cached catalog, agent registry, and the
//! ABOUTME: required-services gate in front of the Workflow Generator.
//! ABOUTME: RwLock-guarded cache mirrors llmspell-providers::ProviderManager.

use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::{AgentRuntime, CatalogNormalizer, McpClient, WorkflowStorage};
use flowcraft_core::types::{OrderedMap, ServiceCatalog, ServiceSchema, User};
use flowcraft_pipeline::{
    run_intent_analyst, run_intent_gatherer, run_workflow_generator, GeneratedWorkflow,
    IntentAnalystInput, IntentGathererInput, StructuredIntent, WorkflowGeneratorInput,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

pub struct AgentManager {
    mcp_client: Arc<dyn McpClient>,
    normalizer: Arc<dyn CatalogNormalizer>,
    agent_runtime: Arc<dyn AgentRuntime>,
    storage: Option<Arc<dyn WorkflowStorage>>,
    catalog_cache: RwLock<Option<ServiceCatalog>>,
}

impl AgentManager {
    pub fn new(
        mcp_client: Arc<dyn McpClient>,
        normalizer: Arc<dyn CatalogNormalizer>,
        agent_runtime: Arc<dyn AgentRuntime>,
        storage: Option<Arc<dyn WorkflowStorage>>,
    ) -> Self {
        Self {
            mcp_client,
            normalizer,
            agent_runtime,
            storage,
            catalog_cache: RwLock::new(None),
        }
    }

    /// Returns the cached catalog, fetching and normalizing it on first use.
    /// Loaded once and cached per the catalog's stated lifecycle; callers
    /// that need a fresh fetch should use `reload_catalog`.
    #[instrument(skip(self))]
    pub async fn get_catalog(&self) -> Result<ServiceCatalog> {
        {
            let cached = self.catalog_cache.read().await;
            if let Some(catalog) = cached.as_ref() {
                return Ok(catalog.clone());
            }
        }
        self.reload_catalog().await
    }

    pub async fn reload_catalog(&self) -> Result<ServiceCatalog> {
        let raw = self.mcp_client.get_service_catalog().await?;
        let catalog = self.normalizer.normalize(&raw);
        let mut cached = self.catalog_cache.write().await;
        *cached = Some(catalog.clone());
        info!(services = catalog.services.len(), "catalog reloaded");
        Ok(catalog)
    }

    /// The catalog filtered to services the user has connected, used as the
    /// `user_capabilities` input for every pipeline stage.
    pub fn user_capabilities(&self, catalog: &ServiceCatalog, user: &User) -> ServiceCatalog {
        let mut services = OrderedMap::new();
        for (name, schema) in catalog.services.iter() {
            if user.has_connected(name) {
                services.insert(name.to_string(), schema.clone());
            }
        }
        ServiceCatalog { services }
    }

    fn missing_required_services(&self, catalog: &ServiceCatalog, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|service| !catalog.services.contains_key(service))
            .cloned()
            .collect()
    }

    /// Runs the full three-stage pipeline for one user turn, sharing the same
    /// catalog/service-schema snapshot across all stages to avoid mid-pipeline
    /// drift, and short-circuiting before the Workflow Generator if the
    /// validated intent names a service absent from the catalog.
    #[instrument(skip(self, user, workflow_id))]
    pub async fn generate_workflow(
        &self,
        user: &User,
        user_id: &str,
        workflow_id: Option<&str>,
        raw_user_message: &str,
    ) -> Result<GeneratedWorkflow> {
        let catalog = self.get_catalog().await?;
        let capabilities = self.user_capabilities(&catalog, user);
        let service_schemas = serde_json::to_value(&schemas_as_map(&catalog))
            .map_err(|e| FlowError::internal(format!("catalog is not serializable: {e}")))?;
        let capabilities_json = serde_json::to_value(&schemas_as_map(&capabilities))
            .map_err(|e| FlowError::internal(format!("capabilities are not serializable: {e}")))?;
        let available_services = self.normalizer.render_available_services(&catalog, None);

        let gathered: StructuredIntent = run_intent_gatherer(
            self.agent_runtime.as_ref(),
            self.stage_storage(workflow_id),
            user_id,
            IntentGathererInput {
                user_message: raw_user_message.to_string(),
                conversation_history: Vec::new(),
                discovery_phase: "initial".to_string(),
                collected_intent: serde_json::Value::Null,
            },
        )
        .await?;

        let validated = run_intent_analyst(
            self.agent_runtime.as_ref(),
            self.stage_storage(workflow_id),
            user_id,
            IntentAnalystInput {
                structured_intent: gathered,
                user_capabilities: capabilities_json,
                service_schemas: service_schemas.clone(),
            },
        )
        .await?;

        let missing = self.missing_required_services(&catalog, &validated.required_services);
        if !missing.is_empty() {
            return Err(FlowError::Agent {
                message: format!("required services not available: {missing:?}"),
            });
        }

        run_workflow_generator(
            self.agent_runtime.as_ref(),
            self.stage_storage(workflow_id),
            user_id,
            WorkflowGeneratorInput {
                raw_user_intent: raw_user_message.to_string(),
                validated_intent: validated,
                service_schemas,
                available_services,
            },
        )
        .await
    }

    fn stage_storage<'a>(&'a self, workflow_id: Option<&'a str>) -> Option<(&'a dyn WorkflowStorage, &'a str)> {
        match (self.storage.as_deref(), workflow_id) {
            (Some(storage), Some(id)) => Some((storage, id)),
            _ => None,
        }
    }
}

fn schemas_as_map(catalog: &ServiceCatalog) -> std::collections::BTreeMap<String, ServiceSchema> {
    catalog
        .services
        .iter()
        .map(|(name, schema)| (name.to_string(), schema.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flowcraft_core::types::{MCPCatalog, McpCallResponse, ServiceStatus};
    use std::collections::HashMap;

    struct StubMcpClient;

    #[async_trait]
    impl McpClient for StubMcpClient {
        async fn get_service_catalog(&self) -> Result<flowcraft_core::types::MCPCatalog> {
            Ok(MCPCatalog { services: Vec::new() })
        }
        async fn call(
            &self,
            _service: &str,
            _action: &str,
            _token: &str,
            _payload: serde_json::Value,
        ) -> Result<McpCallResponse> {
            unimplemented!()
        }
    }

    struct PassthroughNormalizer;

    impl CatalogNormalizer for PassthroughNormalizer {
        fn normalize(&self, _raw: &flowcraft_core::types::MCPCatalog) -> ServiceCatalog {
            let mut services = OrderedMap::new();
            services.insert(
                "gmail".to_string(),
                ServiceSchema {
                    status: ServiceStatus::Available,
                    actions: OrderedMap::new(),
                },
            );
            ServiceCatalog { services }
        }

        fn render_available_services(&self, _catalog: &ServiceCatalog, _only: Option<&[String]>) -> String {
            "gmail: Gmail service".to_string()
        }
    }

    struct StubRuntime;

    #[async_trait]
    impl AgentRuntime for StubRuntime {
        async fn run(
            &self,
            _user_id: &str,
            _template: &str,
            _inputs: &HashMap<String, serde_json::Value>,
            _output_schema: &serde_json::Value,
        ) -> Result<serde_json::Value> {
            unimplemented!("overridden per test via closures is not supported on a static stub")
        }
    }

    #[tokio::test]
    async fn caches_the_catalog_after_first_load() {
        let manager = AgentManager::new(
            Arc::new(StubMcpClient),
            Arc::new(PassthroughNormalizer),
            Arc::new(StubRuntime),
            None,
        );

        let first = manager.get_catalog().await.unwrap();
        let second = manager.get_catalog().await.unwrap();
        assert_eq!(first.services.len(), second.services.len());
        assert!(first.services.contains_key("gmail"));
    }

    #[test]
    fn user_capabilities_filters_to_connected_services() {
        let manager = AgentManager::new(
            Arc::new(StubMcpClient),
            Arc::new(PassthroughNormalizer),
            Arc::new(StubRuntime),
            None,
        );
        let mut catalog_services = OrderedMap::new();
        catalog_services.insert(
            "gmail".to_string(),
            ServiceSchema {
                status: ServiceStatus::Available,
                actions: OrderedMap::new(),
            },
        );
        catalog_services.insert(
            "drive".to_string(),
            ServiceSchema {
                status: ServiceStatus::Available,
                actions: OrderedMap::new(),
            },
        );
        let catalog = ServiceCatalog { services: catalog_services };
        let mut user = User::new("u1", "u1@example.com", "U1");
        user.connected_services.push("gmail".to_string());

        let capabilities = manager.user_capabilities(&catalog, &user);
        assert!(capabilities.services.contains_key("gmail"));
        assert!(!capabilities.services.contains_key("drive"));
    }

    #[test]
    fn reports_every_missing_required_service() {
        let manager = AgentManager::new(
            Arc::new(StubMcpClient),
            Arc::new(PassthroughNormalizer),
            Arc::new(StubRuntime),
            None,
        );
        let mut services = OrderedMap::new();
        services.insert(
            "gmail".to_string(),
            ServiceSchema {
                status: ServiceStatus::Available,
                actions: OrderedMap::new(),
            },
        );
        let catalog = ServiceCatalog { services };

        let missing = manager.missing_required_services(
            &catalog,
            &["gmail".to_string(), "drive".to_string(), "calendar".to_string()],
        );
        assert_eq!(missing, vec!["drive".to_string(), "calendar".to_string()]);
    }
}
