//! Test doubles for the draft endpoints.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use adwizard_core::draft::{CreateDraft, DraftId, DraftPatch, MediaId};
use adwizard_core::error::RemoteError;
use adwizard_core::remote::{DraftApi, ServerMedia, SubmitReceipt, UploadFile, UploadedMedia};
use async_trait::async_trait;
use tokio::sync::Notify;

/// One call observed by [`ScriptedDraftApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum DraftApiCall {
    /// `create_draft`.
    Create(CreateDraft),
    /// `patch_draft`.
    Patch(DraftId, DraftPatch),
    /// `upload_media`, with the uploaded file names.
    Upload(DraftId, Vec<String>),
    /// `reorder_media`.
    Reorder(DraftId, Vec<MediaId>, MediaId),
    /// `submit_draft`.
    Submit(DraftId),
}

#[derive(Debug, Default)]
struct Script {
    calls: Vec<DraftApiCall>,
    create_failures: VecDeque<RemoteError>,
    patch_failures: VecDeque<RemoteError>,
    upload_failures: VecDeque<RemoteError>,
    reorder_failures: VecDeque<RemoteError>,
    reorder_response: Option<Vec<ServerMedia>>,
    submit_outcome: Option<Result<SubmitReceipt, RemoteError>>,
    drafts_created: usize,
    media_uploaded: usize,
    urls: HashMap<MediaId, String>,
}

/// An in-memory draft backend that records every call and fails on cue.
///
/// Failures are queued per operation and consumed one call at a time;
/// with nothing queued every call succeeds. Patches can be held open with
/// [`ScriptedDraftApi::hold_patches`] to exercise overlapping saves.
#[derive(Debug, Default)]
pub struct ScriptedDraftApi {
    script: Mutex<Script>,
    patch_gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedDraftApi {
    /// Creates a backend where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<DraftApiCall> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Only the patches received so far.
    pub fn patches(&self) -> Vec<DraftPatch> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DraftApiCall::Patch(_, patch) => Some(patch),
                _ => None,
            })
            .collect()
    }

    /// Number of calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&DraftApiCall) -> bool) -> usize {
        self.calls().iter().filter(|call| pred(call)).count()
    }

    /// Fails the next `create_draft`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_create(&self, err: RemoteError) {
        self.script.lock().unwrap().create_failures.push_back(err);
    }

    /// Fails the next `patch_draft`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_patch(&self, err: RemoteError) {
        self.script.lock().unwrap().patch_failures.push_back(err);
    }

    /// Fails the next `upload_media`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_upload(&self, err: RemoteError) {
        self.script.lock().unwrap().upload_failures.push_back(err);
    }

    /// Fails the next `reorder_media`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_reorder(&self, err: RemoteError) {
        self.script.lock().unwrap().reorder_failures.push_back(err);
    }

    /// Answers every `reorder_media` with `canonical` instead of echoing the
    /// request.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn respond_to_reorder_with(&self, canonical: Vec<ServerMedia>) {
        self.script.lock().unwrap().reorder_response = Some(canonical);
    }

    /// Sets what every `submit_draft` returns.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_submit_outcome(&self, outcome: Result<SubmitReceipt, RemoteError>) {
        self.script.lock().unwrap().submit_outcome = Some(outcome);
    }

    /// Makes each subsequent `patch_draft` wait for one `notify_one` on the
    /// returned handle before answering.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn hold_patches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.patch_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    fn record(&self, call: DraftApiCall) {
        self.script.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl DraftApi for ScriptedDraftApi {
    async fn create_draft(&self, request: &CreateDraft) -> Result<DraftId, RemoteError> {
        self.record(DraftApiCall::Create(request.clone()));
        let mut script = self.script.lock().unwrap();
        if let Some(err) = script.create_failures.pop_front() {
            return Err(err);
        }
        script.drafts_created += 1;
        Ok(DraftId(format!("draft-{}", script.drafts_created)))
    }

    async fn patch_draft(
        &self,
        draft_id: &DraftId,
        patch: &DraftPatch,
    ) -> Result<DraftPatch, RemoteError> {
        self.record(DraftApiCall::Patch(draft_id.clone(), patch.clone()));
        let gate = self.patch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.script.lock().unwrap().patch_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(patch.clone()),
        }
    }

    async fn upload_media(
        &self,
        draft_id: &DraftId,
        files: &[UploadFile],
    ) -> Result<Vec<UploadedMedia>, RemoteError> {
        self.record(DraftApiCall::Upload(
            draft_id.clone(),
            files.iter().map(|f| f.file_name.clone()).collect(),
        ));
        let mut script = self.script.lock().unwrap();
        if let Some(err) = script.upload_failures.pop_front() {
            return Err(err);
        }
        let mut uploaded = Vec::with_capacity(files.len());
        for _ in files {
            script.media_uploaded += 1;
            let media_id = MediaId(format!("m{}", script.media_uploaded));
            let url = format!("https://cdn.example.test/{media_id}.jpg");
            script.urls.insert(media_id.clone(), url.clone());
            uploaded.push(UploadedMedia { media_id, url });
        }
        Ok(uploaded)
    }

    async fn reorder_media(
        &self,
        draft_id: &DraftId,
        order: &[MediaId],
        cover_id: &MediaId,
    ) -> Result<Vec<ServerMedia>, RemoteError> {
        self.record(DraftApiCall::Reorder(
            draft_id.clone(),
            order.to_vec(),
            cover_id.clone(),
        ));
        let mut script = self.script.lock().unwrap();
        if let Some(err) = script.reorder_failures.pop_front() {
            return Err(err);
        }
        if let Some(canonical) = &script.reorder_response {
            return Ok(canonical.clone());
        }
        Ok(order
            .iter()
            .map(|media_id| ServerMedia {
                media_id: media_id.clone(),
                url: script
                    .urls
                    .get(media_id)
                    .cloned()
                    .unwrap_or_else(|| format!("https://cdn.example.test/{media_id}.jpg")),
                is_cover: media_id == cover_id,
            })
            .collect())
    }

    async fn submit_draft(&self, draft_id: &DraftId) -> Result<SubmitReceipt, RemoteError> {
        self.record(DraftApiCall::Submit(draft_id.clone()));
        match self.script.lock().unwrap().submit_outcome.clone() {
            Some(outcome) => outcome,
            None => Ok(SubmitReceipt {
                detail_url: format!("https://ads.example.test/listing/{draft_id}"),
            }),
        }
    }
}

/// A draft backend where every call fails with a transport error.
#[derive(Debug)]
pub struct FailingDraftApi;

fn refused() -> RemoteError {
    RemoteError::Transport("connection refused".into())
}

#[async_trait]
impl DraftApi for FailingDraftApi {
    async fn create_draft(&self, _request: &CreateDraft) -> Result<DraftId, RemoteError> {
        Err(refused())
    }

    async fn patch_draft(
        &self,
        _draft_id: &DraftId,
        _patch: &DraftPatch,
    ) -> Result<DraftPatch, RemoteError> {
        Err(refused())
    }

    async fn upload_media(
        &self,
        _draft_id: &DraftId,
        _files: &[UploadFile],
    ) -> Result<Vec<UploadedMedia>, RemoteError> {
        Err(refused())
    }

    async fn reorder_media(
        &self,
        _draft_id: &DraftId,
        _order: &[MediaId],
        _cover_id: &MediaId,
    ) -> Result<Vec<ServerMedia>, RemoteError> {
        Err(refused())
    }

    async fn submit_draft(&self, _draft_id: &DraftId) -> Result<SubmitReceipt, RemoteError> {
        Err(refused())
    }
}
