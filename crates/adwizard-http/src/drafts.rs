//! Draft endpoints.

use adwizard_core::draft::{CreateDraft, DraftId, DraftPatch, MediaId};
use adwizard_core::error::RemoteError;
use adwizard_core::remote::{DraftApi, ServerMedia, SubmitReceipt, UploadFile, UploadedMedia};
use async_trait::async_trait;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::backend::HttpBackend;

#[derive(Debug, Deserialize)]
struct CreatedDraft {
    draft_id: DraftId,
}

#[derive(Debug, Serialize)]
struct MediaOrder<'a> {
    order: &'a [MediaId],
    cover_id: &'a MediaId,
}

fn upload_form(files: &[UploadFile]) -> Result<Form, RemoteError> {
    files.iter().try_fold(Form::new(), |form, file| {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| {
                RemoteError::Transport(format!(
                    "{} has an unusable content type: {e}",
                    file.file_name
                ))
            })?;
        Ok(form.part("files", part))
    })
}

#[async_trait]
impl DraftApi for HttpBackend {
    #[instrument(skip(self, request), fields(category = %request.category))]
    async fn create_draft(&self, request: &CreateDraft) -> Result<DraftId, RemoteError> {
        let url = self.endpoint(&["drafts"])?;
        let created: CreatedDraft = self
            .send("create_draft", self.request(Method::POST, url).json(request))
            .await?;
        info!(draft_id = %created.draft_id, "draft allocated");
        Ok(created.draft_id)
    }

    #[instrument(skip(self, patch), fields(draft_id = %draft_id))]
    async fn patch_draft(
        &self,
        draft_id: &DraftId,
        patch: &DraftPatch,
    ) -> Result<DraftPatch, RemoteError> {
        let url = self.endpoint(&["drafts", &draft_id.0])?;
        self.send("patch_draft", self.request(Method::PATCH, url).json(patch))
            .await
    }

    #[instrument(skip(self, files), fields(draft_id = %draft_id, files = files.len()))]
    async fn upload_media(
        &self,
        draft_id: &DraftId,
        files: &[UploadFile],
    ) -> Result<Vec<UploadedMedia>, RemoteError> {
        let url = self.endpoint(&["drafts", &draft_id.0, "media"])?;
        let form = upload_form(files)?;
        self.send("upload_media", self.request(Method::POST, url).multipart(form))
            .await
    }

    #[instrument(skip(self, order), fields(draft_id = %draft_id, cover = %cover_id))]
    async fn reorder_media(
        &self,
        draft_id: &DraftId,
        order: &[MediaId],
        cover_id: &MediaId,
    ) -> Result<Vec<ServerMedia>, RemoteError> {
        let url = self.endpoint(&["drafts", &draft_id.0, "media", "order"])?;
        let body = MediaOrder { order, cover_id };
        self.send("reorder_media", self.request(Method::PUT, url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(draft_id = %draft_id))]
    async fn submit_draft(&self, draft_id: &DraftId) -> Result<SubmitReceipt, RemoteError> {
        let url = self.endpoint(&["drafts", &draft_id.0, "submit"])?;
        self.send("submit_draft", self.request(Method::POST, url))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_upload_form_rejects_malformed_content_type() {
        let files = [UploadFile {
            file_name: "photo.jpg".to_owned(),
            content_type: "not a mime".to_owned(),
            bytes: Arc::from(vec![1_u8, 2, 3]),
        }];

        let result = upload_form(&files);

        assert!(matches!(result, Err(RemoteError::Transport(msg)) if msg.contains("photo.jpg")));
    }

    #[test]
    fn test_media_order_serializes_cover_id() {
        let order = [MediaId("m1".into()), MediaId("m2".into())];
        let cover = MediaId("m2".into());

        let json = serde_json::to_value(MediaOrder {
            order: &order,
            cover_id: &cover,
        })
        .unwrap();

        assert_eq!(json, serde_json::json!({ "order": ["m1", "m2"], "cover_id": "m2" }));
    }
}
