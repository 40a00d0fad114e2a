//! Remote collaborator abstraction for the draft resource.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::draft::{CreateDraft, DraftId, DraftPatch, MediaId};
use crate::error::RemoteError;

/// A file ready to be sent to the media endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// File contents (already metadata-stripped for images).
    pub bytes: Arc<[u8]>,
}

/// Server acknowledgement for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// Server-assigned media identifier.
    pub media_id: MediaId,
    /// Public URL of the stored file.
    pub url: String,
}

/// One entry of the canonical media list returned after a reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMedia {
    /// Server-assigned media identifier.
    pub media_id: MediaId,
    /// Public URL of the stored file.
    pub url: String,
    /// Whether this entry is the cover.
    #[serde(default)]
    pub is_cover: bool,
}

/// Successful publish acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Canonical URL of the published listing.
    pub detail_url: String,
}

/// The draft endpoints the wizard depends on.
#[async_trait]
pub trait DraftApi: Send + Sync {
    /// Allocate a new draft and return its identifier.
    async fn create_draft(&self, request: &CreateDraft) -> Result<DraftId, RemoteError>;

    /// Apply a partial patch; returns the fields the server accepted.
    async fn patch_draft(
        &self,
        draft_id: &DraftId,
        patch: &DraftPatch,
    ) -> Result<DraftPatch, RemoteError>;

    /// Upload a batch of files. The response lists one entry per file, in
    /// request order.
    async fn upload_media(
        &self,
        draft_id: &DraftId,
        files: &[UploadFile],
    ) -> Result<Vec<UploadedMedia>, RemoteError>;

    /// Establish media order and cover in one idempotent call; returns the
    /// canonical ordered list.
    async fn reorder_media(
        &self,
        draft_id: &DraftId,
        order: &[MediaId],
        cover_id: &MediaId,
    ) -> Result<Vec<ServerMedia>, RemoteError>;

    /// Submit the draft for publication. A 422 comes back as
    /// `RemoteError::Rejected`.
    async fn submit_draft(&self, draft_id: &DraftId) -> Result<SubmitReceipt, RemoteError>;
}
