//! ABOUTME: Central configuration — TOML file discovery layered under
//! ABOUTME: `FLOWCRAFT_*` environment variable overrides and field validation

mod env;
mod validation;

pub use env::apply_env_overrides;
pub use validation::validate;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Search order used by `discover_config_file` when no path is given explicitly.
const CONFIG_SEARCH_PATHS: &[&str] = &["flowcraft.toml", ".flowcraft.toml", "config/flowcraft.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    NotFound { path: String },

    #[error("configuration validation failed in field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("environment variable '{name}' could not be parsed: {message}")]
    Environment { name: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct McpConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    Memory,
    Filesystem,
    Gcs,
}

impl Default for StorageBackendKind {
    fn default() -> Self {
        Self::Filesystem
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Root directory for the `filesystem` backend.
    pub root: String,
    /// Bucket name for the `gcs` backend.
    pub gcs_bucket: String,
    /// Object-key prefix for the `gcs` backend.
    pub gcs_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            root: "./data/workflows".to_string(),
            gcs_bucket: String::new(),
            gcs_prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    pub ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            sweep_interval_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the provider API key, never
    /// the key itself — this struct is serialized into logs and diagnostics.
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "FLOWCRAFT_LLM_API_KEY".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or `"flowcraft_engine=debug,info"`.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Central Flowcraft configuration: TOML file, then `FLOWCRAFT_*` env overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FlowcraftConfig {
    /// Deployment environment name, e.g. `development` or `production`.
    pub environment: String,
    pub server: ServerConfig,
    pub mcp: McpConfig,
    pub storage: StorageConfig,
    pub tokens: TokenConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

impl Default for FlowcraftConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            mcp: McpConfig::default(),
            storage: StorageConfig::default(),
            tokens: TokenConfig::default(),
            llm: LlmConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FlowcraftConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    /// Search `CONFIG_SEARCH_PATHS` in order, returning the first existing file.
    pub async fn discover_config_file() -> Option<PathBuf> {
        for candidate in CONFIG_SEARCH_PATHS {
            let path = PathBuf::from(candidate);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }

    /// Load from an explicit path, or discover one, or fall back to defaults;
    /// env overrides and validation are applied in every case.
    pub async fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit_path {
            Some(path) => Self::load_from_file(path).await?,
            None => match Self::discover_config_file().await {
                Some(path) => Self::load_from_file(&path).await?,
                None => Self::default(),
            },
        };
        apply_env_overrides(&mut config)?;
        validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FlowcraftConfig::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn parses_a_partial_toml_document() {
        let config = FlowcraftConfig::from_toml(
            r#"
            [server]
            port = 9090

            [mcp]
            base_url = "http://mcp.internal:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.mcp.base_url, "http://mcp.internal:9000");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[tokio::test]
    async fn load_from_file_reports_not_found() {
        let result = FlowcraftConfig::load_from_file(Path::new("/nonexistent/flowcraft.toml")).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn load_falls_back_to_defaults_when_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let result = FlowcraftConfig::load(None).await;
        std::env::set_current_dir(original).unwrap();
        assert!(result.is_ok());
    }
}
