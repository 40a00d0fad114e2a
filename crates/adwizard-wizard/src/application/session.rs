//! Draft Session: sole owner of the remote draft identity.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use adwizard_core::draft::{CreateDraft, Draft, DraftId, DraftPatch, MediaId};
use adwizard_core::error::{RemoteError, WizardError};
use adwizard_core::remote::DraftApi;
use tracing::{info, instrument, warn};

#[derive(Debug, Default)]
struct SessionState {
    draft: Draft,
    superseded: bool,
}

/// Mediates every read and write of the draft. Local state is optimistic
/// until a call here returns success.
pub struct DraftSession {
    api: Arc<dyn DraftApi>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for DraftSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftSession")
            .field("draft_id", &self.draft_id())
            .finish_non_exhaustive()
    }
}

impl DraftSession {
    /// A session with no draft yet.
    #[must_use]
    pub fn new(api: Arc<dyn DraftApi>) -> Self {
        Self {
            api,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Remote collaborator, for calls that thread the draft id explicitly.
    #[must_use]
    pub fn api(&self) -> &dyn DraftApi {
        self.api.as_ref()
    }

    /// The draft id, once assigned.
    #[must_use]
    pub fn draft_id(&self) -> Option<DraftId> {
        self.lock().draft.id.clone()
    }

    /// Snapshot of the local mirror.
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.lock().draft.clone()
    }

    /// Whether the draft was superseded by a publish.
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        self.lock().superseded
    }

    /// Allocates the remote draft. When one already exists its id is
    /// returned unchanged; the id never changes once assigned.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::DraftCreate` when allocation fails; the id
    /// stays unset.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        category: &str,
        module: &str,
        country: &str,
    ) -> Result<DraftId, WizardError> {
        if let Some(id) = self.open_id()? {
            return Ok(id);
        }
        let request = CreateDraft {
            category: category.to_owned(),
            module: module.to_owned(),
            country: country.to_owned(),
        };
        let id = self.api.create_draft(&request).await.map_err(|err| {
            warn!(error = %err, "draft create failed");
            WizardError::DraftCreate(err.summary())
        })?;

        let mut state = self.lock();
        if let Some(existing) = &state.draft.id {
            return Ok(existing.clone());
        }
        state.draft = Draft {
            id: Some(id.clone()),
            category: request.category,
            module: request.module,
            country: request.country,
            ..Draft::default()
        };
        info!(draft_id = %id, "draft created");
        Ok(id)
    }

    /// Sends a partial patch and mirrors the accepted fields locally.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::DraftSave` when there is no draft or the patch
    /// fails, and `WizardError::DraftClosed` after publish.
    #[instrument(skip(self, patch), fields(fields = ?patch.field_paths()))]
    pub async fn patch(&self, patch: &DraftPatch) -> Result<DraftPatch, WizardError> {
        let id = self.require_id()?;
        let accepted = self.api.patch_draft(&id, patch).await.map_err(|err| {
            warn!(draft_id = %id, error = %err, "draft patch failed");
            save_error(&err)
        })?;
        self.lock().draft.apply(&accepted);
        Ok(accepted)
    }

    /// The id of an open draft.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::DraftClosed` after publish and
    /// `WizardError::DraftSave` when no draft exists yet.
    pub fn require_id(&self) -> Result<DraftId, WizardError> {
        self.open_id()?
            .ok_or_else(|| WizardError::DraftSave("no draft has been created yet".to_owned()))
    }

    /// Mirrors the canonical media order after a reorder call.
    pub fn record_media(&self, order: Vec<MediaId>, cover: Option<MediaId>) {
        let mut state = self.lock();
        state.draft.media = order;
        state.draft.cover = cover;
    }

    /// Closes the draft after publish. Later mutations are refused.
    pub fn supersede(&self) {
        let mut state = self.lock();
        state.superseded = true;
        state.draft.media.clear();
        state.draft.cover = None;
    }

    fn open_id(&self) -> Result<Option<DraftId>, WizardError> {
        let state = self.lock();
        match (&state.draft.id, state.superseded) {
            (Some(id), true) => Err(WizardError::DraftClosed(id.clone())),
            (id, _) => Ok(id.clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn save_error(err: &RemoteError) -> WizardError {
    WizardError::DraftSave(err.summary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adwizard_test_support::{DraftApiCall, FailingDraftApi, ScriptedDraftApi};

    #[tokio::test]
    async fn test_create_assigns_id_once() {
        // Arrange
        let api = Arc::new(ScriptedDraftApi::new());
        let session = DraftSession::new(api.clone());

        // Act
        let first = session.create("otomobil", "vehicle", "DE").await.unwrap();
        let second = session.create("otomobil", "vehicle", "DE").await.unwrap();

        // Assert
        assert_eq!(first, second);
        assert_eq!(api.count(|c| matches!(c, DraftApiCall::Create(_))), 1);
        assert_eq!(session.draft().country, "DE");
    }

    #[tokio::test]
    async fn test_create_failure_leaves_id_unset() {
        let session = DraftSession::new(Arc::new(FailingDraftApi));

        let err = session.create("otomobil", "vehicle", "DE").await.unwrap_err();

        assert!(matches!(err, WizardError::DraftCreate(_)));
        assert_eq!(session.draft_id(), None);
    }

    #[tokio::test]
    async fn test_patch_without_draft_is_a_save_error() {
        let api = Arc::new(ScriptedDraftApi::new());
        let session = DraftSession::new(api.clone());

        let err = session.patch(&DraftPatch::default()).await.unwrap_err();

        assert!(matches!(err, WizardError::DraftSave(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_patch_mirrors_accepted_fields_only_on_success() {
        // Arrange
        let api = Arc::new(ScriptedDraftApi::new());
        let session = DraftSession::new(api.clone());
        session.create("otomobil", "vehicle", "DE").await.unwrap();
        let patch = DraftPatch {
            make_id: Some("bmw".into()),
            ..DraftPatch::default()
        };
        api.fail_next_patch(RemoteError::Transport("reset".into()));

        // Act
        let failed = session.patch(&patch).await;
        let mirrored_after_failure = session.draft().make_id;
        session.patch(&patch).await.unwrap();

        // Assert
        assert!(matches!(failed, Err(WizardError::DraftSave(_))));
        assert_eq!(mirrored_after_failure, None);
        assert_eq!(session.draft().make_id.as_deref(), Some("bmw"));
    }

    #[tokio::test]
    async fn test_superseded_draft_refuses_mutation() {
        let api = Arc::new(ScriptedDraftApi::new());
        let session = DraftSession::new(api.clone());
        let id = session.create("otomobil", "vehicle", "DE").await.unwrap();

        session.supersede();

        assert_eq!(
            session.patch(&DraftPatch::default()).await,
            Err(WizardError::DraftClosed(id.clone()))
        );
        assert_eq!(
            session.create("otomobil", "vehicle", "DE").await,
            Err(WizardError::DraftClosed(id))
        );
    }
}
