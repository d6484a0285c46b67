//! ABOUTME: Field-level validation run once after loading and env overrides

use crate::{ConfigError, FlowcraftConfig, StorageBackendKind};

pub fn validate(config: &FlowcraftConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Validation {
            field: "server.port".to_string(),
            message: "port must be non-zero".to_string(),
        });
    }
    if config.mcp.base_url.is_empty() {
        return Err(ConfigError::Validation {
            field: "mcp.base_url".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if config.mcp.timeout_seconds == 0 {
        return Err(ConfigError::Validation {
            field: "mcp.timeout_seconds".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    match config.storage.backend {
        StorageBackendKind::Filesystem if config.storage.root.is_empty() => {
            return Err(ConfigError::Validation {
                field: "storage.root".to_string(),
                message: "required when storage.backend is 'filesystem'".to_string(),
            });
        }
        StorageBackendKind::Gcs if config.storage.gcs_bucket.is_empty() => {
            return Err(ConfigError::Validation {
                field: "storage.gcs_bucket".to_string(),
                message: "required when storage.backend is 'gcs'".to_string(),
            });
        }
        _ => {}
    }
    if config.tokens.ttl_seconds == 0 {
        return Err(ConfigError::Validation {
            field: "tokens.ttl_seconds".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.llm.model.is_empty() {
        return Err(ConfigError::Validation {
            field: "llm.model".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_zero_port() {
        let mut config = FlowcraftConfig::default();
        config.server.port = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_filesystem_backend_with_empty_root() {
        let mut config = FlowcraftConfig::default();
        config.storage.backend = StorageBackendKind::Filesystem;
        config.storage.root = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_gcs_backend_without_a_bucket() {
        let mut config = FlowcraftConfig::default();
        config.storage.backend = StorageBackendKind::Gcs;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn accepts_memory_backend_regardless_of_root() {
        let mut config = FlowcraftConfig::default();
        config.storage.backend = StorageBackendKind::Memory;
        config.storage.root = String::new();
        assert!(validate(&config).is_ok());
    }
}
