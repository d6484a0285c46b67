//! ABOUTME: Configuration for the MCP transport client

use std::time::Duration;

/// Configuration for a single MCP client instance.
#[derive(Debug, Clone)]
pub struct McpClientConfig {
    /// Base URL of the MCP deployment (e.g. `https://mcp.example.com`).
    pub base_url: String,
    /// Per-call timeout. Defaults to 30s, matching the engine's MCP timeout default.
    pub timeout: Duration,
}

impl McpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
