//! ABOUTME: Storage-layer carrier types — WorkflowFile and artifact kinds

use super::workflow::WorkflowDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of artifact written alongside a workflow, mapping to a storage subpath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Prompt,
    Response,
    ExecutionLog,
    /// Root of the workflow's directory (`""` / `"."` in the storage contract).
    Root,
}

impl ArtifactKind {
    pub fn subpath(self) -> &'static str {
        match self {
            Self::Prompt => "prompts",
            Self::Response => "responses",
            Self::ExecutionLog => "logs",
            Self::Root => "",
        }
    }
}

/// Storage-layer carrier for a saved workflow: raw declarative text plus,
/// when parseable, the parsed IR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowFile {
    /// `<user_id>_<workflow_id>`
    pub id: String,
    pub filename: String,
    pub path: String,
    pub user_id: String,
    pub name: String,
    pub content: String,
    pub parsed_data: Option<WorkflowDocument>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowFile {
    pub fn compose_id(user_id: &str, workflow_dir: &str) -> String {
        format!("{user_id}_{workflow_dir}")
    }
}
