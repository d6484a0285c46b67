//! ABOUTME: HTTP/JSON implementation of the MCP Client contract
//! ABOUTME: Fetches the catalog and dispatches single action calls with a bearer token

use crate::config::McpClientConfig;
use async_trait::async_trait;
use flowcraft_core::error::{DispatchClass, FlowError, Result};
use flowcraft_core::traits::McpClient;
use flowcraft_core::types::{MCPCatalog, McpCallError, McpCallResponse};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

/// A blocking-per-call (no streaming, no retries) HTTP client for MCP.
///
/// `Call` is specified as synchronous from the caller's point of view: one
/// request, one response, no automatic retry. This type is unaware of any
/// workflow semantics — it only knows how to fetch a catalog and dispatch a
/// single action.
pub struct HttpMcpClient {
    http: Client,
    config: McpClientConfig,
}

impl HttpMcpClient {
    pub fn new(config: McpClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FlowError::internal(format!("failed to build MCP http client: {e}")))?;
        Ok(Self { http, config })
    }

    fn status_class(status: StatusCode) -> DispatchClass {
        match status.as_u16() {
            401 | 403 => DispatchClass::Auth,
            404 => DispatchClass::NotFound,
            400 | 422 => DispatchClass::Invalid,
            500..=599 => DispatchClass::Server,
            _ => DispatchClass::Transport,
        }
    }
}

#[async_trait]
impl McpClient for HttpMcpClient {
    #[instrument(skip(self))]
    async fn get_service_catalog(&self) -> Result<MCPCatalog> {
        let url = format!("{}/catalog", self.config.base_url.trim_end_matches('/'));
        let response = self.http.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "mcp catalog fetch transport failure");
            FlowError::CatalogUnavailable {
                message: e.to_string(),
            }
        })?;

        if !response.status().is_success() {
            return Err(FlowError::CatalogUnavailable {
                message: format!("MCP catalog endpoint returned {}", response.status()),
            });
        }

        response.json::<MCPCatalog>().await.map_err(|e| {
            FlowError::CatalogUnavailable {
                message: format!("malformed catalog response: {e}"),
            }
        })
    }

    #[instrument(skip(self, token, payload), fields(service, action))]
    async fn call(
        &self,
        service: &str,
        action: &str,
        token: &str,
        payload: serde_json::Value,
    ) -> Result<McpCallResponse> {
        let url = format!(
            "{}/services/{service}/actions/{action}",
            self.config.base_url.trim_end_matches('/')
        );

        debug!(%url, "dispatching mcp action");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FlowError::Dispatch {
                step_id: String::new(),
                class: DispatchClass::Transport,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            let data = response.json::<serde_json::Value>().await.map_err(|e| {
                FlowError::Dispatch {
                    step_id: String::new(),
                    class: DispatchClass::Invalid,
                    message: format!("malformed response body: {e}"),
                }
            })?;
            return Ok(McpCallResponse {
                success: true,
                data,
                error: None,
            });
        }

        let class = Self::status_class(status);
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        Ok(McpCallResponse {
            success: false,
            data: serde_json::Value::Null,
            error: Some(McpCallError { class, message }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_catalog_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "services": []
            })))
            .mount(&server)
            .await;

        let client = HttpMcpClient::new(McpClientConfig::new(server.uri())).unwrap();
        let catalog = client.get_service_catalog().await.unwrap();
        assert!(catalog.services.is_empty());
    }

    #[tokio::test]
    async fn maps_401_to_auth_dispatch_class() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/gmail/actions/send_message"))
            .respond_with(ResponseTemplate::new(401).set_body_string("no token"))
            .mount(&server)
            .await;

        let client = HttpMcpClient::new(McpClientConfig::new(server.uri())).unwrap();
        let result = client
            .call("gmail", "send_message", "bad-token", serde_json::json!({}))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error.unwrap().class, DispatchClass::Auth);
    }

    #[tokio::test]
    async fn successful_call_returns_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/gmail/actions/send_message"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message_id": "abc123"})),
            )
            .mount(&server)
            .await;

        let client = HttpMcpClient::new(McpClientConfig::new(server.uri())).unwrap();
        let result = client
            .call("gmail", "send_message", "token", serde_json::json!({"to": "a@b.com"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.data["message_id"], "abc123");
    }
}
