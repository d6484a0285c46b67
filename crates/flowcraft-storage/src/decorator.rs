//! ABOUTME: Wraps a WorkflowStorage backend and populates `parsed_data` on every
//! ABOUTME: read/write, so no backend needs to know about the IR parser itself

use async_trait::async_trait;
use flowcraft_core::traits::{WorkflowParser, WorkflowStorage};
use flowcraft_core::types::{ArtifactKind, WorkflowFile};
use flowcraft_core::Result;
use flowcraft_ir::DeclarativeWorkflowParser;

pub struct ParsingDecorator<B> {
    inner: B,
    parser: DeclarativeWorkflowParser,
}

impl<B> ParsingDecorator<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            parser: DeclarativeWorkflowParser::new(),
        }
    }

    fn with_parsed_data(&self, mut file: WorkflowFile) -> WorkflowFile {
        file.parsed_data = self.parser.parse(&file.content).ok();
        file
    }
}

#[async_trait]
impl<B> WorkflowStorage for ParsingDecorator<B>
where
    B: WorkflowStorage + Send + Sync,
{
    async fn save_workflow(&self, user_id: &str, name: &str, content: &str) -> Result<WorkflowFile> {
        let file = self.inner.save_workflow(user_id, name, content).await?;
        Ok(self.with_parsed_data(file))
    }

    async fn get_workflow(&self, user_id: &str, id: &str) -> Result<WorkflowFile> {
        let file = self.inner.get_workflow(user_id, id).await?;
        Ok(self.with_parsed_data(file))
    }

    async fn list_user_workflows(&self, user_id: &str) -> Result<Vec<WorkflowFile>> {
        let files = self.inner.list_user_workflows(user_id).await?;
        Ok(files.into_iter().map(|f| self.with_parsed_data(f)).collect())
    }

    async fn delete_workflow(&self, user_id: &str, id: &str) -> Result<()> {
        self.inner.delete_workflow(user_id, id).await
    }

    async fn save_artifact(
        &self,
        user_id: &str,
        workflow_id: &str,
        kind: ArtifactKind,
        filename: &str,
        content: &str,
    ) -> Result<()> {
        self.inner
            .save_artifact(user_id, workflow_id, kind, filename, content)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    const DOC: &str = r#"
        name: "Send email"
        description: "desc"
        version: "1.0"
        steps: [
            { id: "send", name: "Send", action: "gmail.send_message", parameters: { to: "${user.recipient_email}" } }
        ]
    "#;

    #[tokio::test]
    async fn populates_parsed_data_on_save_and_get() {
        let storage = ParsingDecorator::new(MemoryBackend::new());
        let saved = storage.save_workflow("u1", "flow", DOC).await.unwrap();
        assert!(saved.parsed_data.is_some());
        assert_eq!(saved.parsed_data.unwrap().name, "Send email");

        let fetched = storage.get_workflow("u1", &saved.id).await.unwrap();
        assert!(fetched.parsed_data.is_some());
    }

    #[tokio::test]
    async fn leaves_parsed_data_empty_for_unparseable_content() {
        let storage = ParsingDecorator::new(MemoryBackend::new());
        let saved = storage.save_workflow("u1", "flow", "not a valid doc {{{").await.unwrap();
        assert!(saved.parsed_data.is_none());
    }
}
