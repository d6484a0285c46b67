//! ABOUTME: Filesystem storage backend — the development-time WorkflowStorage
//! ABOUTME: implementation, laying out `<root>/<user_id>/<timestamp>_<name>/workflow.flow`

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::WorkflowStorage;
use flowcraft_core::types::{ArtifactKind, WorkflowFile};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

const WORKFLOW_FILENAME: &str = "workflow.flow";

pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.root.join(user_id)
    }

    fn workflow_dir(&self, user_id: &str, dir_name: &str) -> PathBuf {
        self.user_dir(user_id).join(dir_name)
    }

    /// `<user_id>_<workflow_dir>` is the public id; this recovers the directory
    /// name half so reads/deletes can address the on-disk layout.
    fn dir_name_from_id(user_id: &str, id: &str) -> Result<String> {
        id.strip_prefix(&format!("{user_id}_"))
            .map(str::to_string)
            .ok_or_else(|| FlowError::NotFound {
                message: format!("workflow id '{id}' does not belong to user '{user_id}'"),
            })
    }

    async fn find_dir_by_id(&self, user_id: &str, id: &str) -> Result<PathBuf> {
        let dir_name = Self::dir_name_from_id(user_id, id)?;
        let dir = self.workflow_dir(user_id, &dir_name);
        if fs::metadata(&dir).await.is_err() {
            return Err(FlowError::NotFound {
                message: format!("workflow '{id}' not found"),
            });
        }
        Ok(dir)
    }

    async fn read_workflow_file(&self, user_id: &str, dir: &Path) -> Result<WorkflowFile> {
        let workflow_path = dir.join(WORKFLOW_FILENAME);
        let content = fs::read_to_string(&workflow_path).await?;
        let dir_name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let name = dir_name
            .splitn(2, '_')
            .nth(1)
            .unwrap_or(&dir_name)
            .to_string();
        let metadata = fs::metadata(&workflow_path).await?;
        let created_at = metadata
            .created()
            .ok()
            .map(chrono::DateTime::<Utc>::from)
            .unwrap_or_else(Utc::now);

        Ok(WorkflowFile {
            id: WorkflowFile::compose_id(user_id, &dir_name),
            filename: WORKFLOW_FILENAME.to_string(),
            path: workflow_path.to_string_lossy().to_string(),
            user_id: user_id.to_string(),
            name,
            content,
            parsed_data: None,
            created_at,
        })
    }
}

#[async_trait]
impl WorkflowStorage for FilesystemBackend {
    #[instrument(skip(self, content))]
    async fn save_workflow(&self, user_id: &str, name: &str, content: &str) -> Result<WorkflowFile> {
        let timestamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let dir_name = format!("{timestamp}_{name}");
        let dir = self.workflow_dir(user_id, &dir_name);
        fs::create_dir_all(&dir).await?;
        for sub in ["prompts", "responses", "logs"] {
            fs::create_dir_all(dir.join(sub)).await?;
        }
        fs::write(dir.join(WORKFLOW_FILENAME), content).await?;

        Ok(WorkflowFile {
            id: WorkflowFile::compose_id(user_id, &dir_name),
            filename: WORKFLOW_FILENAME.to_string(),
            path: dir.join(WORKFLOW_FILENAME).to_string_lossy().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            parsed_data: None,
            created_at: Utc::now(),
        })
    }

    async fn get_workflow(&self, user_id: &str, id: &str) -> Result<WorkflowFile> {
        let dir = self.find_dir_by_id(user_id, id).await?;
        self.read_workflow_file(user_id, &dir).await
    }

    async fn list_user_workflows(&self, user_id: &str) -> Result<Vec<WorkflowFile>> {
        let user_dir = self.user_dir(user_id);
        let mut entries = match fs::read_dir(&user_dir).await {
            Ok(entries) => entries,
            Err(_) => return Ok(Vec::new()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                if let Ok(file) = self.read_workflow_file(user_id, &entry.path()).await {
                    files.push(file);
                }
            }
        }
        Ok(files)
    }

    async fn delete_workflow(&self, user_id: &str, id: &str) -> Result<()> {
        let dir = self.find_dir_by_id(user_id, id).await?;
        fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    async fn save_artifact(
        &self,
        user_id: &str,
        workflow_id: &str,
        kind: ArtifactKind,
        filename: &str,
        content: &str,
    ) -> Result<()> {
        let dir = self.find_dir_by_id(user_id, workflow_id).await?;
        let target_dir = if kind.subpath().is_empty() {
            dir
        } else {
            dir.join(kind.subpath())
        };
        fs::create_dir_all(&target_dir).await?;
        fs::write(target_dir.join(filename), content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saves_and_reads_back_a_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        let saved = backend
            .save_workflow("user-1", "my-flow", "workflow: {}")
            .await
            .unwrap();

        let fetched = backend.get_workflow("user-1", &saved.id).await.unwrap();
        assert_eq!(fetched.content, "workflow: {}");
        assert_eq!(fetched.user_id, "user-1");
    }

    #[tokio::test]
    async fn lists_only_the_requesting_users_workflows() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        backend.save_workflow("user-a", "flow-1", "workflow: {}").await.unwrap();
        backend.save_workflow("user-b", "flow-2", "workflow: {}").await.unwrap();

        let a_workflows = backend.list_user_workflows("user-a").await.unwrap();
        assert_eq!(a_workflows.len(), 1);
        assert!(a_workflows[0].id.starts_with("user-a_"));
    }

    #[tokio::test]
    async fn deletes_a_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let saved = backend.save_workflow("user-1", "flow", "workflow: {}").await.unwrap();

        backend.delete_workflow("user-1", &saved.id).await.unwrap();
        let result = backend.get_workflow("user-1", &saved.id).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn save_prompt_artifact_lands_under_prompts_subdir() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let saved = backend.save_workflow("user-1", "flow", "workflow: {}").await.unwrap();

        backend
            .save_artifact("user-1", &saved.id, ArtifactKind::Prompt, "stage1.txt", "rendered prompt")
            .await
            .unwrap();

        let expected = dir.path().join("user-1").join(
            Path::new(&saved.path)
                .parent()
                .unwrap()
                .file_name()
                .unwrap(),
        );
        let content = fs::read_to_string(expected.join("prompts").join("stage1.txt"))
            .await
            .unwrap();
        assert_eq!(content, "rendered prompt");
    }
}
