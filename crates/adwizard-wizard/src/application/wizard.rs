//! The `Wizard` facade: one instance per listing being created.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use adwizard_core::clock::Clock;
use adwizard_core::config::WizardConfig;
use adwizard_core::draft::{Draft, DraftId, DraftPatch};
use adwizard_core::error::{ValidationError, WizardError};
use adwizard_core::remote::DraftApi;
use adwizard_core::step::StepKind;
use adwizard_core::telemetry::{
    DRAFT_CREATED, MEDIA_UPLOAD_FAILED, SAVE_FAILED, TelemetryEvent, TelemetrySink,
};
use adwizard_media::{ImageReencoder, LocalFile, MediaError, MediaItem, MediaList, MediaRejection};
use adwizard_schema::{
    CachedCatalog, CatalogLookup, CategorySchema, Make, Model, SchemaLoadError, SchemaLookup,
    load_schema,
};
use adwizard_validation::{NumberLocale, StepForm, validate_step};
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::application::autosave::{AutosaveCoordinator, SaveOutcome};
use crate::application::media::MediaPipeline;
use crate::application::publish::{PublishCoordinator, PublishOutcome};
use crate::application::session::DraftSession;
use crate::domain::notices::Notice;
use crate::domain::state::{Phase, WizardState};
use crate::domain::steps::{StepSequence, resolve_steps};

/// Collaborators a wizard needs.
pub struct WizardDeps {
    /// Draft endpoints.
    pub api: Arc<dyn DraftApi>,
    /// Category schema lookup.
    pub schemas: Arc<dyn SchemaLookup>,
    /// Make/model lookup; wrapped in a TTL cache by the wizard.
    pub catalog: Arc<dyn CatalogLookup>,
    /// Telemetry destination.
    pub telemetry: Arc<dyn TelemetrySink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Image re-encoder for the privacy strip.
    pub encoder: Arc<dyn ImageReencoder>,
}

/// Files taken into the media list, and those refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaIntake {
    /// Local ids of the accepted files, in pick order.
    pub added: Vec<Uuid>,
    /// One error per refused file.
    pub rejected: Vec<ValidationError>,
}

#[derive(Debug)]
struct Inner {
    state: WizardState,
    media: MediaList,
    schema: Option<Arc<CategorySchema>>,
    /// Last validated patch sent for each step.
    committed: HashMap<StepKind, DraftPatch>,
}

/// Drives one listing from category choice to publish.
///
/// All methods take `&self`; state lives behind a mutex that is never held
/// across an await, so a UI can keep calling in while a save is pending.
pub struct Wizard {
    config: WizardConfig,
    locale: NumberLocale,
    schemas: Arc<dyn SchemaLookup>,
    catalog: CachedCatalog,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    session: DraftSession,
    autosave: AutosaveCoordinator,
    media: MediaPipeline,
    publisher: PublishCoordinator,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Wizard {
    /// Opens a wizard on step 1 for the configured module.
    #[must_use]
    pub fn new(config: WizardConfig, deps: WizardDeps) -> Self {
        let sequence = resolve_steps(&config.module_key);
        Self {
            locale: NumberLocale::for_country(&config.country),
            schemas: deps.schemas,
            catalog: CachedCatalog::new(deps.catalog),
            session: DraftSession::new(deps.api),
            autosave: AutosaveCoordinator::new(
                Arc::clone(&deps.telemetry),
                Arc::clone(&deps.clock),
                config.notice_ttl,
            ),
            media: MediaPipeline::new(config.media, deps.encoder),
            publisher: PublishCoordinator::new(
                Arc::clone(&deps.telemetry),
                Arc::clone(&deps.clock),
                config.notice_ttl,
            ),
            telemetry: deps.telemetry,
            clock: deps.clock,
            inner: Mutex::new(Inner {
                state: WizardState::new(sequence),
                media: MediaList::new(),
                schema: None,
                committed: HashMap::new(),
            }),
            config,
        }
    }

    /// Configuration the wizard was opened with.
    #[must_use]
    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    /// Snapshot of the wizard state.
    #[must_use]
    pub fn state(&self) -> WizardState {
        self.lock().state.clone()
    }

    /// Notices still showing; expired ones are dropped.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        let now = self.clock.now();
        let mut inner = self.lock();
        inner.state.notices.purge(now);
        inner.state.notices.active(now).into_iter().cloned().collect()
    }

    /// Snapshot of the local draft mirror.
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.session.draft()
    }

    /// Draft id, once assigned.
    #[must_use]
    pub fn draft_id(&self) -> Option<DraftId> {
        self.session.draft_id()
    }

    /// Media items in display order.
    #[must_use]
    pub fn media(&self) -> Vec<MediaItem> {
        self.lock().media.items().to_vec()
    }

    /// Schema of the chosen category, once step 1 is saved.
    #[must_use]
    pub fn schema(&self) -> Option<Arc<CategorySchema>> {
        self.lock().schema.clone()
    }

    /// Moves to 1-based `target`.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NavigationBlocked` for a forward move past an
    /// incomplete step and `WizardError::DraftClosed` after publish.
    pub fn goto(&self, target: usize) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.lock().state.goto(target)
    }

    /// Saves a step and marks it complete without moving the pointer.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Validation` before any network call when the
    /// form is invalid; otherwise the normalised failure of the save.
    #[instrument(skip(self, form), fields(step = %form.step()))]
    pub async fn complete(&self, form: StepForm) -> Result<SaveOutcome, WizardError> {
        self.ensure_open()?;
        let Some(_guard) = self.autosave.try_begin() else {
            debug!("save already in flight");
            return Ok(SaveOutcome::InProgress);
        };
        self.save_locked(&form).await
    }

    /// Saves the active step, then advances.
    ///
    /// A complete step whose form validates to the patch it was last saved
    /// with is not sent again. Any other form goes through
    /// [`Wizard::complete`], so a changed value at a revisited step resets
    /// the steps after it.
    ///
    /// # Errors
    ///
    /// Same as [`Wizard::complete`], plus `NavigationBlocked` if advancing is
    /// refused.
    pub async fn next(&self, form: StepForm) -> Result<SaveOutcome, WizardError> {
        self.ensure_open()?;
        let (current, unchanged) = {
            let inner = self.lock();
            let current = inner.state.current();
            let step = form.step();
            let unchanged = inner.state.gate().is_complete(current)
                && inner.state.sequence().step_at(current) == Some(step)
                && validate_step(&form, inner.schema.as_deref(), self.locale)
                    .is_ok_and(|patch| inner.committed.get(&step) == Some(&patch));
            (current, unchanged)
        };
        let outcome = if unchanged {
            SaveOutcome::AlreadyComplete
        } else {
            match self.complete(form).await? {
                SaveOutcome::InProgress => return Ok(SaveOutcome::InProgress),
                outcome => outcome,
            }
        };

        let mut inner = self.lock();
        if inner.state.current() == current && current < inner.state.sequence().review() {
            inner.state.goto(current + 1)?;
        }
        Ok(outcome)
    }

    /// Fetches makes for the brand step. Always goes to the network; the
    /// cached list answers when it fails.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Transport` when the fetch fails with nothing
    /// cached.
    pub async fn enter_brand_step(&self) -> Result<Arc<Vec<Make>>, WizardError> {
        self.catalog
            .refresh_makes(&self.config.country)
            .await
            .map_err(|err| WizardError::Transport(err.summary()))
    }

    /// Fetches models of the saved make for the model step.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Validation` when no make is saved yet and
    /// `WizardError::Transport` when the fetch fails with nothing cached.
    pub async fn enter_model_step(&self) -> Result<Arc<Vec<Model>>, WizardError> {
        let make_id = self.saved_make()?;
        self.catalog
            .refresh_models(&self.config.country, &make_id)
            .await
            .map_err(|err| WizardError::Transport(err.summary()))
    }

    /// Makes to show immediately, before [`Wizard::enter_brand_step`]
    /// returns. Served from the catalog cache once it holds the country.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Transport` when nothing is cached and the
    /// fetch fails.
    pub async fn brand_options(&self) -> Result<Arc<Vec<Make>>, WizardError> {
        self.catalog
            .cached_makes(&self.config.country)
            .await
            .map_err(|err| WizardError::Transport(err.summary()))
    }

    /// Models of the saved make to show immediately, before
    /// [`Wizard::enter_model_step`] returns.
    ///
    /// # Errors
    ///
    /// Same as [`Wizard::enter_model_step`].
    pub async fn model_options(&self) -> Result<Arc<Vec<Model>>, WizardError> {
        let make_id = self.saved_make()?;
        self.catalog
            .cached_models(&self.config.country, &make_id)
            .await
            .map_err(|err| WizardError::Transport(err.summary()))
    }

    fn saved_make(&self) -> Result<String, WizardError> {
        self.session.draft().make_id.ok_or_else(|| {
            WizardError::Validation(vec![ValidationError::new(
                "make_id",
                "REQUIRED",
                "Please choose a make first.",
            )])
        })
    }

    /// Re-encodes picked files and appends the accepted ones. Refused files
    /// are reported inline on the features/media step.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::DraftClosed` after publish.
    pub fn add_media(&self, files: Vec<LocalFile>) -> Result<MediaIntake, WizardError> {
        self.ensure_open()?;
        let report = self.media.intake(files);
        let rejected: Vec<ValidationError> = report
            .rejected
            .iter()
            .map(MediaRejection::to_validation_error)
            .collect();

        let mut inner = self.lock();
        let added = inner.media.add(report.accepted);
        if rejected.is_empty() {
            inner.state.inline_errors.remove(&StepKind::FeaturesMedia);
        } else {
            inner
                .state
                .inline_errors
                .insert(StepKind::FeaturesMedia, rejected.clone());
        }
        if !added.is_empty() {
            media_edited(&mut inner.state);
        }
        Ok(MediaIntake { added, rejected })
    }

    /// Removes a media item.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Validation` for an unknown item.
    pub fn remove_media(&self, local_id: Uuid) -> Result<(), WizardError> {
        self.edit_media(|list| list.remove(local_id).map(drop))
    }

    /// Reorders the media list locally; persisted when the step is saved.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Validation` unless `new_order` is a permutation.
    pub fn reorder_media(&self, new_order: &[usize]) -> Result<(), WizardError> {
        self.edit_media(|list| list.reorder(new_order))
    }

    /// Makes one item the cover.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Validation` for an unknown item.
    pub fn set_cover(&self, local_id: Uuid) -> Result<(), WizardError> {
        self.edit_media(|list| list.set_cover(local_id))
    }

    /// Dismisses a notice.
    pub fn dismiss_notice(&self, id: Uuid) -> bool {
        self.lock().state.notices.dismiss(id)
    }

    /// Dismisses publish-panel entries for `field`.
    pub fn dismiss_publish_error(&self, field: &str) -> bool {
        let mut inner = self.lock();
        let before = inner.state.publish_errors.len();
        inner.state.publish_errors.retain(|err| err.field != field);
        inner.state.publish_errors.len() != before
    }

    /// Submits the draft for publication.
    ///
    /// # Errors
    ///
    /// Returns `NavigationBlocked` when a step before review is incomplete or
    /// the wizard is not on the review step, `PublishRejected` with the server's field errors, `Transport` for any
    /// other failure and `DraftClosed` once published.
    #[instrument(skip(self))]
    pub async fn publish(&self) -> Result<PublishOutcome, WizardError> {
        self.ensure_open()?;
        {
            let inner = self.lock();
            let review = inner.state.sequence().review();
            if let Some(required) = inner.state.gate().first_incomplete_before(review) {
                return Err(WizardError::NavigationBlocked {
                    target: review,
                    required,
                });
            }
            if inner.state.current() != review {
                return Err(WizardError::NavigationBlocked {
                    target: review,
                    required: review - 1,
                });
            }
        }
        let draft_id = self.session.require_id()?;
        let Some(_guard) = self.autosave.try_begin() else {
            return Ok(PublishOutcome::InProgress);
        };

        self.lock().state.phase = Phase::Publishing;
        let result = self.publisher.submit(&self.session, &draft_id).await;

        let mut inner = self.lock();
        self.publisher.record(&mut inner.state, &result);
        if result.is_ok() {
            inner.media = MediaList::new();
            inner.schema = None;
            inner.committed.clear();
        }
        result.map(|detail_url| PublishOutcome::Published { detail_url })
    }

    async fn save_locked(&self, form: &StepForm) -> Result<SaveOutcome, WizardError> {
        let step = form.step();
        let draft_id = self.session.draft_id();
        let schema = {
            let mut inner = self.lock();
            let Some(number) = inner.state.sequence().number_of(step) else {
                return Err(WizardError::Validation(vec![ValidationError::new(
                    "step",
                    "UNKNOWN_STEP",
                    format!("{step} is not part of this listing."),
                )]));
            };
            inner
                .state
                .gate()
                .check_move(1, number)
                .map_err(|required| WizardError::NavigationBlocked {
                    target: number,
                    required,
                })?;
            self.autosave.started(&mut inner.state);
            inner.schema.clone()
        };

        let patch = match validate_step(form, schema.as_deref(), self.locale) {
            Ok(patch) => patch,
            Err(report) => {
                let mut inner = self.lock();
                return Err(self.autosave.rejected_locally(
                    &mut inner.state,
                    draft_id.as_ref(),
                    step,
                    report.into_errors(),
                ));
            }
        };

        let sent = patch.clone();
        let result = match step {
            StepKind::Category => self.save_category(patch).await,
            StepKind::FeaturesMedia => self.save_features_media(patch).await,
            StepKind::Review => self.session.require_id().map(|id| (id, patch)),
            _ => self.save_fields(patch).await,
        };

        let mut inner = self.lock();
        match result {
            Ok((id, accepted)) => {
                let unchanged = inner.committed.get(&step) == Some(&sent);
                let outcome =
                    self.autosave
                        .committed(&mut inner.state, &id, step, &accepted, unchanged);
                inner.committed.insert(step, sent);
                if step == StepKind::FeaturesMedia && inner.media.pending().next().is_some() {
                    debug!(draft_id = %id, "photos picked during the save still need uploading");
                    media_edited(&mut inner.state);
                }
                Ok(outcome)
            }
            Err(err) => {
                let event = if matches!(err, WizardError::MediaUpload(_)) {
                    if let Some(number) = inner.state.sequence().number_of(step) {
                        inner.state.gate_mut().mark_incomplete(number);
                    }
                    MEDIA_UPLOAD_FAILED
                } else {
                    SAVE_FAILED
                };
                let draft_id = self.session.draft_id();
                self.autosave
                    .failed(&mut inner.state, draft_id.as_ref(), step, event, &err);
                Err(err)
            }
        }
    }

    async fn save_fields(&self, patch: DraftPatch) -> Result<(DraftId, DraftPatch), WizardError> {
        let id = self.session.require_id()?;
        let accepted = self.session.patch(&patch).await?;
        Ok((id, accepted))
    }

    async fn save_category(
        &self,
        patch: DraftPatch,
    ) -> Result<(DraftId, DraftPatch), WizardError> {
        let category = patch.category.clone().unwrap_or_default();
        let schema = load_schema(self.schemas.as_ref(), &category)
            .await
            .map_err(|err| match err {
                SchemaLoadError::Remote(remote) => WizardError::Transport(remote.summary()),
                SchemaLoadError::Invalid(invalid) => WizardError::Schema(invalid.to_string()),
            })?;

        let (id, accepted) = match self.session.draft_id() {
            Some(id) => {
                let accepted = self.session.patch(&patch).await?;
                (id, accepted)
            }
            None => {
                let module = schema.module_key();
                let id = self
                    .session
                    .create(&category, module, &self.config.country)
                    .await?;
                self.telemetry.emit(
                    TelemetryEvent::new(
                        DRAFT_CREATED,
                        Some(id.clone()),
                        Some(StepKind::Category),
                        self.clock.as_ref(),
                    )
                    .with_attributes(json!({
                        "category": category,
                        "module": module,
                        "country": self.config.country,
                    })),
                );
                (id, patch)
            }
        };

        let mut inner = self.lock();
        let sequence = StepSequence::for_module(schema.module_kind());
        if sequence != inner.state.sequence() {
            info!(
                category = %category,
                module = schema.module_key(),
                steps = sequence.len(),
                "category selects a different step sequence"
            );
            inner.state.resequence(sequence);
            inner.committed.clear();
        }
        inner.schema = Some(Arc::new(schema));
        Ok((id, accepted))
    }

    async fn save_features_media(
        &self,
        patch: DraftPatch,
    ) -> Result<(DraftId, DraftPatch), WizardError> {
        let id = self.session.require_id()?;
        let mut list = self.lock().media.clone();
        self.media.check_count(&list)?;
        let snapshot: HashSet<Uuid> = list.items().iter().map(|item| item.local_id).collect();

        let synced = async {
            self.media
                .upload_new(self.session.api(), &id, &mut list)
                .await?;
            self.media
                .commit_order(self.session.api(), &id, &mut list)
                .await
        }
        .await;
        self.merge_media(list, &snapshot);
        let canonical = synced?;

        self.session.record_media(
            canonical.iter().map(|m| m.media_id.clone()).collect(),
            canonical
                .iter()
                .find(|m| m.is_cover)
                .map(|m| m.media_id.clone()),
        );
        let accepted = self.session.patch(&patch).await?;
        Ok((id, accepted))
    }

    /// Installs the synced list, keeping items picked while it was in flight.
    fn merge_media(&self, mut synced: MediaList, snapshot: &HashSet<Uuid>) {
        let mut inner = self.lock();
        let picked_meanwhile: Vec<MediaItem> = inner
            .media
            .items()
            .iter()
            .filter(|item| !snapshot.contains(&item.local_id))
            .cloned()
            .collect();
        synced.adopt(picked_meanwhile);
        inner.media = synced;
    }

    fn edit_media(
        &self,
        edit: impl FnOnce(&mut MediaList) -> Result<(), MediaError>,
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        let mut inner = self.lock();
        edit(&mut inner.media).map_err(|err| {
            WizardError::Validation(vec![ValidationError::new(
                "media",
                "INVALID_MEDIA_OPERATION",
                err.to_string(),
            )])
        })?;
        media_edited(&mut inner.state);
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        match self.session.draft_id() {
            Some(id) if self.session.is_superseded() => Err(WizardError::DraftClosed(id)),
            _ => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Local media edits are not persisted until the step is saved again.
fn media_edited(state: &mut WizardState) {
    if let Some(number) = state.sequence().number_of(StepKind::FeaturesMedia) {
        state.gate_mut().mark_incomplete(number);
    }
}
