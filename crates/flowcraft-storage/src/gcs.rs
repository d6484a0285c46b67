//! ABOUTME: Object-store backend targeting the GCS JSON API over `reqwest`.
//! ABOUTME: Production WorkflowStorage implementation; no filesystem or local state.

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::WorkflowStorage;
use flowcraft_core::types::{ArtifactKind, WorkflowFile};
use serde::Deserialize;
use tracing::instrument;

const API_BASE: &str = "https://storage.googleapis.com/storage/v1/b";
const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1/b";

/// Config is env-driven in production (`GCS_BUCKET_NAME`, `GCS_WORKFLOWS_PREFIX`,
/// `GCS_SERVICE_ACCOUNT_KEY`); the bearer token here is the already-exchanged
/// access token, since the workspace stack has no OAuth2/JWT-signing crate.
pub struct GcsBackend {
    http: reqwest::Client,
    bucket: String,
    prefix: String,
    access_token: String,
    api_base: String,
    upload_base: String,
}

impl GcsBackend {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            bucket: bucket.into(),
            prefix: prefix.into(),
            access_token: access_token.into(),
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Points at an alternate JSON-API/upload host; used by tests to target a mock server.
    #[cfg(test)]
    fn with_bases(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            bucket: bucket.into(),
            prefix: prefix.into(),
            access_token: access_token.into(),
            api_base: api_base.into(),
            upload_base: upload_base.into(),
        }
    }

    fn object_name(&self, user_id: &str, dir_name: &str, filename: &str) -> String {
        format!("{}/{user_id}/{dir_name}/{filename}", self.prefix.trim_end_matches('/'))
    }

    fn dir_name_from_id(&self, user_id: &str, id: &str) -> Result<String> {
        id.strip_prefix(&format!("{user_id}_"))
            .map(str::to_string)
            .ok_or_else(|| FlowError::NotFound {
                message: format!("workflow id '{id}' does not belong to user '{user_id}'"),
            })
    }

    async fn upload_object(&self, object_name: &str, content: &str) -> Result<()> {
        let url = format!("{}/{}/o", self.upload_base, self.bucket);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "media"), ("name", object_name)])
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| FlowError::internal(format!("GCS upload transport error: {e}")))?;

        if !response.status().is_success() {
            return Err(FlowError::internal(format!(
                "GCS upload failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn download_object(&self, object_name: &str) -> Result<String> {
        let encoded = urlencode(object_name);
        let url = format!("{}/{}/o/{encoded}", self.api_base, self.bucket);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| FlowError::internal(format!("GCS download transport error: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FlowError::NotFound {
                message: format!("object '{object_name}' not found"),
            });
        }
        if !response.status().is_success() {
            return Err(FlowError::internal(format!(
                "GCS download failed with status {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| FlowError::internal(format!("GCS response body error: {e}")))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct ListResponse {
            #[serde(default)]
            items: Vec<ObjectItem>,
        }
        #[derive(Deserialize)]
        struct ObjectItem {
            name: String,
        }

        let url = format!("{}/{}/o", self.api_base, self.bucket);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("prefix", prefix)])
            .send()
            .await
            .map_err(|e| FlowError::internal(format!("GCS list transport error: {e}")))?;

        if !response.status().is_success() {
            return Err(FlowError::internal(format!(
                "GCS list failed with status {}",
                response.status()
            )));
        }
        let parsed: ListResponse = response
            .json()
            .await
            .map_err(|e| FlowError::internal(format!("GCS list response error: {e}")))?;
        Ok(parsed.items.into_iter().map(|i| i.name).collect())
    }

    async fn delete_object(&self, object_name: &str) -> Result<()> {
        let encoded = urlencode(object_name);
        let url = format!("{}/{}/o/{encoded}", self.api_base, self.bucket);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| FlowError::internal(format!("GCS delete transport error: {e}")))?;

        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(FlowError::internal(format!(
                "GCS delete failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn urlencode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[async_trait]
impl WorkflowStorage for GcsBackend {
    #[instrument(skip(self, content))]
    async fn save_workflow(&self, user_id: &str, name: &str, content: &str) -> Result<WorkflowFile> {
        let timestamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let dir_name = format!("{timestamp}_{name}");
        let object_name = self.object_name(user_id, &dir_name, "workflow.flow");
        self.upload_object(&object_name, content).await?;

        Ok(WorkflowFile {
            id: WorkflowFile::compose_id(user_id, &dir_name),
            filename: "workflow.flow".to_string(),
            path: format!("gs://{}/{object_name}", self.bucket),
            user_id: user_id.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            parsed_data: None,
            created_at: Utc::now(),
        })
    }

    async fn get_workflow(&self, user_id: &str, id: &str) -> Result<WorkflowFile> {
        let dir_name = self.dir_name_from_id(user_id, id)?;
        let object_name = self.object_name(user_id, &dir_name, "workflow.flow");
        let content = self.download_object(&object_name).await?;
        let name = dir_name.splitn(2, '_').nth(1).unwrap_or(&dir_name).to_string();

        Ok(WorkflowFile {
            id: id.to_string(),
            filename: "workflow.flow".to_string(),
            path: format!("gs://{}/{object_name}", self.bucket),
            user_id: user_id.to_string(),
            name,
            content,
            parsed_data: None,
            created_at: Utc::now(),
        })
    }

    async fn list_user_workflows(&self, user_id: &str) -> Result<Vec<WorkflowFile>> {
        let prefix = format!("{}/{user_id}/", self.prefix.trim_end_matches('/'));
        let names = self.list_objects(&prefix).await?;

        let mut dir_names: Vec<String> = names
            .iter()
            .filter(|n| n.ends_with("/workflow.flow"))
            .filter_map(|n| n.strip_prefix(&prefix))
            .filter_map(|n| n.strip_suffix("/workflow.flow"))
            .map(str::to_string)
            .collect();
        dir_names.sort();

        let mut files = Vec::new();
        for dir_name in dir_names {
            let id = WorkflowFile::compose_id(user_id, &dir_name);
            if let Ok(file) = self.get_workflow(user_id, &id).await {
                files.push(file);
            }
        }
        Ok(files)
    }

    async fn delete_workflow(&self, user_id: &str, id: &str) -> Result<()> {
        let dir_name = self.dir_name_from_id(user_id, id)?;
        let prefix = format!("{}/{user_id}/{dir_name}/", self.prefix.trim_end_matches('/'));
        for object_name in self.list_objects(&prefix).await? {
            self.delete_object(&object_name).await?;
        }
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
        let dir_name = self.dir_name_from_id(user_id, workflow_id)?;
        let object_name = if kind.subpath().is_empty() {
            self.object_name(user_id, &dir_name, filename)
        } else {
            format!(
                "{}/{user_id}/{dir_name}/{}/{filename}",
                self.prefix.trim_end_matches('/'),
                kind.subpath()
            )
        };
        self.upload_object(&object_name, content).await
    }
}
