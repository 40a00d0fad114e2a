//! Media Pipeline: intake, upload of new items and order commit.

use std::sync::Arc;

use adwizard_core::config::MediaPolicy;
use adwizard_core::draft::DraftId;
use adwizard_core::error::WizardError;
use adwizard_core::remote::{DraftApi, ServerMedia};
use adwizard_media::{ImageReencoder, IntakeReport, LocalFile, MediaList, prepare_files};
use tracing::{debug, info, warn};

/// Runs picked files through the privacy re-encode and talks to the media
/// endpoints. The draft id is always passed in by the caller.
pub struct MediaPipeline {
    policy: MediaPolicy,
    encoder: Arc<dyn ImageReencoder>,
}

impl std::fmt::Debug for MediaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPipeline")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl MediaPipeline {
    /// Creates a pipeline applying `policy`.
    #[must_use]
    pub fn new(policy: MediaPolicy, encoder: Arc<dyn ImageReencoder>) -> Self {
        Self { policy, encoder }
    }

    /// Active media policy.
    #[must_use]
    pub fn policy(&self) -> &MediaPolicy {
        &self.policy
    }

    /// Strips metadata from every picked file and applies the resolution
    /// policy.
    #[must_use]
    pub fn intake(&self, files: Vec<LocalFile>) -> IntakeReport {
        let report = prepare_files(files, self.encoder.as_ref(), &self.policy);
        debug!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "media intake"
        );
        report
    }

    /// Enforces the minimum photo count.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::MediaUpload` when the list is too short.
    pub fn check_count(&self, list: &MediaList) -> Result<(), WizardError> {
        let min = self.policy.min_photos;
        if list.len() < min {
            return Err(WizardError::MediaUpload(format!(
                "at least {min} photos are required, {} added",
                list.len()
            )));
        }
        Ok(())
    }

    /// Uploads the items that have no server id yet, as one batch. Either
    /// every item of the batch gets its id or none does.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::MediaUpload` when the batch fails or the
    /// response does not match it.
    pub async fn upload_new(
        &self,
        api: &dyn DraftApi,
        draft_id: &DraftId,
        list: &mut MediaList,
    ) -> Result<usize, WizardError> {
        let (local_ids, files): (Vec<_>, Vec<_>) = list.pending_uploads().into_iter().unzip();
        if files.is_empty() {
            debug!(draft_id = %draft_id, "no new media to upload");
            return Ok(0);
        }

        let uploaded = api.upload_media(draft_id, &files).await.map_err(|err| {
            warn!(draft_id = %draft_id, files = files.len(), error = %err, "media batch failed");
            WizardError::MediaUpload(err.summary())
        })?;
        list.assign_server_ids(&local_ids, &uploaded)
            .map_err(|err| WizardError::MediaUpload(err.to_string()))?;

        info!(draft_id = %draft_id, count = uploaded.len(), "media uploaded");
        Ok(uploaded.len())
    }

    /// Establishes order and cover in one call, then adopts the server's
    /// list as authoritative.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::MediaUpload` while items are not uploaded or
    /// when the call fails.
    pub async fn commit_order(
        &self,
        api: &dyn DraftApi,
        draft_id: &DraftId,
        list: &mut MediaList,
    ) -> Result<Vec<ServerMedia>, WizardError> {
        let (order, cover) = list
            .server_order()
            .map_err(|err| WizardError::MediaUpload(err.to_string()))?;
        let Some(cover) = cover else {
            return Ok(Vec::new());
        };

        let canonical = api
            .reorder_media(draft_id, &order, &cover)
            .await
            .map_err(|err| {
                warn!(draft_id = %draft_id, error = %err, "media order commit failed");
                WizardError::MediaUpload(err.summary())
            })?;
        list.reconcile(&canonical);
        Ok(canonical)
    }
}
