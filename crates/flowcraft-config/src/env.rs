//! ABOUTME: `FLOWCRAFT_*` environment variable overrides, applied after the
//! ABOUTME: TOML file is loaded so the process environment always wins

use crate::{ConfigError, FlowcraftConfig, StorageBackendKind};

/// Apply every recognized `FLOWCRAFT_*` variable found in the process
/// environment on top of `config`. Unrecognized `FLOWCRAFT_*` variables are
/// ignored rather than rejected, since downstream crates (MCP auth, LLM
/// provider keys) read their own env vars directly.
pub fn apply_env_overrides(config: &mut FlowcraftConfig) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var("FLOWCRAFT_ENVIRONMENT") {
        config.environment = value;
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_SERVER_HOST") {
        config.server.host = value;
    }
    if let Some(value) = parse_env("FLOWCRAFT_SERVER_PORT")? {
        config.server.port = value;
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_MCP_BASE_URL") {
        config.mcp.base_url = value;
    }
    if let Some(value) = parse_env("FLOWCRAFT_MCP_TIMEOUT_SECONDS")? {
        config.mcp.timeout_seconds = value;
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_STORAGE_BACKEND") {
        config.storage.backend = match value.as_str() {
            "memory" => StorageBackendKind::Memory,
            "filesystem" => StorageBackendKind::Filesystem,
            "gcs" => StorageBackendKind::Gcs,
            other => {
                return Err(ConfigError::Environment {
                    name: "FLOWCRAFT_STORAGE_BACKEND".to_string(),
                    message: format!("unknown storage backend '{other}'"),
                })
            }
        };
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_STORAGE_ROOT") {
        config.storage.root = value;
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_STORAGE_GCS_BUCKET") {
        config.storage.gcs_bucket = value;
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_STORAGE_GCS_PREFIX") {
        config.storage.gcs_prefix = value;
    }
    if let Some(value) = parse_env("FLOWCRAFT_TOKENS_TTL_SECONDS")? {
        config.tokens.ttl_seconds = value;
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_LLM_BASE_URL") {
        config.llm.base_url = value;
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_LLM_MODEL") {
        config.llm.model = value;
    }
    if let Ok(value) = std::env::var("FLOWCRAFT_LOG_FILTER") {
        config.logging.filter = value;
    }
    if let Some(value) = parse_env("FLOWCRAFT_LOG_JSON")? {
        config.logging.json = value;
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Environment {
                name: name.to_string(),
                message: format!("could not parse '{raw}'"),
            }),
        Err(_) => Ok(None),
    }
}
