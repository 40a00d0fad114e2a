//! Publish Coordinator: final submit with three distinct outcomes.

use std::sync::Arc;
use std::time::Duration;

use adwizard_core::clock::Clock;
use adwizard_core::draft::DraftId;
use adwizard_core::error::{RemoteError, WizardError};
use adwizard_core::telemetry::{
    PUBLISH_FAILED, PUBLISH_REJECTED, PUBLISH_SUCCEEDED, TelemetryEvent, TelemetrySink,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::application::session::DraftSession;
use crate::domain::notices::NoticeScope;
use crate::domain::state::{Phase, WizardState};

/// Result of a publish request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The listing is live.
    Published {
        /// Canonical detail page.
        detail_url: String,
    },
    /// A save or publish already holds the lock.
    InProgress,
}

/// Submits the draft and classifies the answer.
pub struct PublishCoordinator {
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    notice_ttl: chrono::Duration,
}

impl std::fmt::Debug for PublishCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishCoordinator").finish_non_exhaustive()
    }
}

impl PublishCoordinator {
    /// Creates a coordinator.
    #[must_use]
    pub fn new(
        telemetry: Arc<dyn TelemetrySink>,
        clock: Arc<dyn Clock>,
        notice_ttl: Duration,
    ) -> Self {
        Self {
            telemetry,
            clock,
            notice_ttl: chrono::Duration::from_std(notice_ttl)
                .unwrap_or_else(|_| chrono::Duration::seconds(6)),
        }
    }

    /// Submits the draft. On success the session is superseded and the
    /// detail URL returned; nothing else changes on failure.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::PublishRejected` with the server's field errors
    /// on a 422, and `WizardError::Transport` for anything else.
    #[instrument(skip(self, session))]
    pub async fn submit(
        &self,
        session: &DraftSession,
        draft_id: &DraftId,
    ) -> Result<String, WizardError> {
        match session.api().submit_draft(draft_id).await {
            Ok(receipt) => {
                session.supersede();
                info!(draft_id = %draft_id, detail_url = %receipt.detail_url, "listing published");
                self.emit(PUBLISH_SUCCEEDED, draft_id, json!({ "detail_url": receipt.detail_url }));
                Ok(receipt.detail_url)
            }
            Err(RemoteError::Rejected(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                warn!(draft_id = %draft_id, fields = ?fields, "publish rejected");
                self.emit(PUBLISH_REJECTED, draft_id, json!({ "fields": fields }));
                Err(WizardError::PublishRejected(errors))
            }
            Err(err) => {
                warn!(draft_id = %draft_id, error = %err, "publish failed");
                self.emit(PUBLISH_FAILED, draft_id, json!({ "reason": err.summary() }));
                Err(WizardError::Transport(err.summary()))
            }
        }
    }

    /// Applies a publish result to the wizard state.
    ///
    /// Success discards the state and leaves only the published phase.
    /// A rejection fills the publish panel and keeps the user on review.
    /// Any other failure raises a transient banner and changes nothing else.
    pub fn record(&self, state: &mut WizardState, result: &Result<String, WizardError>) {
        match result {
            Ok(detail_url) => {
                *state = WizardState::new(state.sequence());
                state.phase = Phase::Published {
                    detail_url: detail_url.clone(),
                };
            }
            Err(WizardError::PublishRejected(errors)) => {
                state.publish_errors.clone_from(errors);
                state.phase = Phase::Failed;
            }
            Err(err) => {
                state.phase = Phase::Editing;
                state.notices.transient(
                    err.kind(),
                    err.user_message(),
                    NoticeScope::Banner,
                    self.clock.now(),
                    self.notice_ttl,
                );
            }
        }
    }

    fn emit(&self, name: &'static str, draft_id: &DraftId, attributes: serde_json::Value) {
        self.telemetry.emit(
            TelemetryEvent::new(name, Some(draft_id.clone()), None, self.clock.as_ref())
                .with_attributes(attributes),
        );
    }
}
