//! ABOUTME: In-memory storage backend used by tests and by pipeline/engine
//! ABOUTME: crates that need a WorkflowStorage without filesystem or network I/O

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::WorkflowStorage;
use flowcraft_core::types::{ArtifactKind, WorkflowFile};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryBackend {
    workflows: Mutex<HashMap<String, WorkflowFile>>,
    artifacts: Mutex<HashMap<String, String>>,
    counter: Mutex<u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_dir_name(&self, name: &str) -> String {
        let mut counter = self.counter.lock();
        *counter += 1;
        format!("{:020}_{name}", *counter)
    }

    fn artifact_key(user_id: &str, workflow_id: &str, kind: ArtifactKind, filename: &str) -> String {
        format!("{user_id}/{workflow_id}/{}/{filename}", kind.subpath())
    }
}

#[async_trait]
impl WorkflowStorage for MemoryBackend {
    async fn save_workflow(&self, user_id: &str, name: &str, content: &str) -> Result<WorkflowFile> {
        let dir_name = self.next_dir_name(name);
        let id = WorkflowFile::compose_id(user_id, &dir_name);
        let file = WorkflowFile {
            id: id.clone(),
            filename: "workflow.flow".to_string(),
            path: format!("memory://{id}"),
            user_id: user_id.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            parsed_data: None,
            created_at: Utc::now(),
        };
        self.workflows.lock().insert(id, file.clone());
        Ok(file)
    }

    async fn get_workflow(&self, user_id: &str, id: &str) -> Result<WorkflowFile> {
        self.workflows
            .lock()
            .get(id)
            .filter(|f| f.user_id == user_id)
            .cloned()
            .ok_or_else(|| FlowError::NotFound {
                message: format!("workflow '{id}' not found"),
            })
    }

    async fn list_user_workflows(&self, user_id: &str) -> Result<Vec<WorkflowFile>> {
        let mut files: Vec<WorkflowFile> = self
            .workflows
            .lock()
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(files)
    }

    async fn delete_workflow(&self, user_id: &str, id: &str) -> Result<()> {
        let mut workflows = self.workflows.lock();
        match workflows.get(id) {
            Some(f) if f.user_id == user_id => {
                workflows.remove(id);
                Ok(())
            }
            _ => Err(FlowError::NotFound {
                message: format!("workflow '{id}' not found"),
            }),
        }
    }

    async fn save_artifact(
        &self,
        user_id: &str,
        workflow_id: &str,
        kind: ArtifactKind,
        filename: &str,
        content: &str,
    ) -> Result<()> {
        if !self.workflows.lock().contains_key(workflow_id) {
            return Err(FlowError::NotFound {
                message: format!("workflow '{workflow_id}' not found"),
            });
        }
        let key = Self::artifact_key(user_id, workflow_id, kind, filename);
        self.artifacts.lock().insert(key, content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrips_a_workflow() {
        let backend = MemoryBackend::new();
        let saved = backend.save_workflow("u1", "flow", "content").await.unwrap();
        let fetched = backend.get_workflow("u1", &saved.id).await.unwrap();
        assert_eq!(fetched.content, "content");
    }

    #[tokio::test]
    async fn rejects_cross_user_access() {
        let backend = MemoryBackend::new();
        let saved = backend.save_workflow("u1", "flow", "content").await.unwrap();
        let result = backend.get_workflow("u2", &saved.id).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn saving_artifact_against_unknown_workflow_fails() {
        let backend = MemoryBackend::new();
        let result = backend
            .save_artifact("u1", "nonexistent", ArtifactKind::Prompt, "a.txt", "x")
            .await;
        assert!(result.is_err());
    }
}
