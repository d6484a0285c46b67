//! ABOUTME: Error types shared across the workflow engine
//! ABOUTME: One enum per user-visible error kind from the system's error handling design

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MCP dispatch failure subclass, mirrors the HTTP status class the MCP Client maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchClass {
    Auth,
    Invalid,
    NotFound,
    Transport,
    Server,
}

/// Comprehensive error enum for all Flowcraft operations.
///
/// Each variant corresponds to one of the enumerated error kinds in the
/// error handling design: callers map these to stable HTTP statuses at
/// the API boundary rather than branching on `Debug` output.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("bad input: {message}")]
    BadInput { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("missing credential for user {user_id}")]
    MissingCredential { user_id: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("validation failed: {issues:?}")]
    Validation { issues: Vec<String> },

    #[error("catalog unavailable: {message}")]
    CatalogUnavailable { message: String },

    #[error("agent error: {message}")]
    Agent { message: String },

    #[error("dispatch error on step '{step_id}' ({class:?}): {message}")]
    Dispatch {
        step_id: String,
        class: DispatchClass,
        message: String,
    },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl FlowError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInput {
            message: message.into(),
        }
    }

    pub fn validation(issues: Vec<String>) -> Self {
        Self::Validation { issues }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable phase tag surfaced to callers (`validation_error`, `dispatch_error`, …),
    /// used by the HTTP layer's `{error, phase?}` body and by CLI diagnostics.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::BadInput { .. } => "bad_input",
            Self::Unauthorized { .. } => "unauthorized",
            Self::MissingCredential { .. } => "missing_credential",
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation_error",
            Self::CatalogUnavailable { .. } => "catalog_unavailable",
            Self::Agent { .. } => "agent_error",
            Self::Dispatch { .. } => "dispatch_error",
            Self::Internal { .. } => "internal",
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadInput {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
        }
    }
}

/// Convenience Result type alias used across every Flowcraft crate.
pub type Result<T> = std::result::Result<T, FlowError>;
