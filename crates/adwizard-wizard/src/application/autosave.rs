//! Autosave Coordinator: single-flight saves and outcome bookkeeping.
//!
//! One boolean lock per wizard instance. A save (or publish) issued while
//! another is outstanding is answered with [`SaveOutcome::InProgress`]
//! instead of being queued, so patches reach the server in the order the
//! user committed them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use adwizard_core::clock::Clock;
use adwizard_core::draft::{DraftId, DraftPatch};
use adwizard_core::error::{ValidationError, WizardError};
use adwizard_core::step::StepKind;
use adwizard_core::telemetry::{
    PROGRESS_INVALIDATED, STEP_SAVED, TelemetryEvent, TelemetrySink, VALIDATION_FAILED,
};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::notices::NoticeScope;
use crate::domain::state::{AutosaveStatus, Phase, WizardState};

/// Result of a save request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The step was persisted and marked complete.
    Saved {
        /// Step that was saved.
        step: StepKind,
        /// Steps whose completion was reset by the cascade.
        invalidated: Vec<StepKind>,
    },
    /// The step was already complete; nothing was sent.
    AlreadyComplete,
    /// Another save holds the lock; nothing was sent.
    InProgress,
}

/// Holds the single-flight lock; releases it on drop.
#[derive(Debug)]
pub struct SaveGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Serialises saves and records their outcome in the wizard state.
pub struct AutosaveCoordinator {
    in_flight: AtomicBool,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    notice_ttl: chrono::Duration,
}

impl std::fmt::Debug for AutosaveCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveCoordinator")
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl AutosaveCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(
        telemetry: Arc<dyn TelemetrySink>,
        clock: Arc<dyn Clock>,
        notice_ttl: Duration,
    ) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            telemetry,
            clock,
            notice_ttl: chrono::Duration::from_std(notice_ttl)
                .unwrap_or_else(|_| chrono::Duration::seconds(6)),
        }
    }

    /// Whether a save currently holds the lock.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Takes the lock, or returns `None` when a save is already in flight.
    #[must_use]
    pub fn try_begin(&self) -> Option<SaveGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SaveGuard {
                flag: &self.in_flight,
            })
    }

    /// Flags the autosave indicator as saving.
    pub fn started(&self, state: &mut WizardState) {
        state.autosave = AutosaveStatus::Saving {
            since: self.clock.now(),
        };
    }

    /// Records a successful save of `step` (1-based `number`).
    ///
    /// A save that lands while the user is already further ahead never moves
    /// the pointer. If it carries exactly the payload committed before for
    /// that step, later steps keep their completion; otherwise the cascade
    /// applies and is reported as `progress_invalidated`.
    pub fn committed(
        &self,
        state: &mut WizardState,
        draft_id: &DraftId,
        step: StepKind,
        accepted: &DraftPatch,
        unchanged: bool,
    ) -> SaveOutcome {
        let sequence = state.sequence();
        let Some(number) = sequence.number_of(step) else {
            return SaveOutcome::Saved {
                step,
                invalidated: Vec::new(),
            };
        };
        let late = state.current() > number;

        let cleared = if late && unchanged {
            state.gate_mut().mark_complete_without_cascade(number);
            Vec::new()
        } else {
            state.gate_mut().mark_complete(number)
        };
        let invalidated: Vec<StepKind> = cleared
            .iter()
            .filter_map(|n| sequence.step_at(*n))
            .collect();

        let now = self.clock.now();
        if state.phase == Phase::Failed {
            state.phase = Phase::Editing;
        }
        state.autosave = AutosaveStatus::Success { at: now };
        state.inline_errors.remove(&step);
        state.notices.dismiss_kind("draft_save_error");
        let touched = accepted.field_paths();
        state
            .publish_errors
            .retain(|err| !touches(&touched, &err.field));
        state.notices.resolve_fields(&touched);

        info!(draft_id = %draft_id, step = %step, late, "step saved");
        self.telemetry.emit(
            TelemetryEvent::new(STEP_SAVED, Some(draft_id.clone()), Some(step), self.clock.as_ref())
                .with_attributes(json!({ "fields": touched, "late": late })),
        );

        if late && !invalidated.is_empty() {
            let keys: Vec<&str> = invalidated.iter().map(|s| s.key()).collect();
            warn!(
                draft_id = %draft_id,
                step = %step,
                invalidated = ?keys,
                "late save changed an earlier step; later steps need confirming again"
            );
            self.telemetry.emit(
                TelemetryEvent::new(
                    PROGRESS_INVALIDATED,
                    Some(draft_id.clone()),
                    Some(step),
                    self.clock.as_ref(),
                )
                .with_attributes(json!({ "invalidated": keys })),
            );
            state.notices.transient(
                "progress_invalidated",
                format!("Your change to {step} means later steps need to be confirmed again."),
                NoticeScope::Banner,
                now,
                self.notice_ttl,
            );
        }

        SaveOutcome::Saved { step, invalidated }
    }

    /// Records a local validation failure. Nothing reached the network.
    pub fn rejected_locally(
        &self,
        state: &mut WizardState,
        draft_id: Option<&DraftId>,
        step: StepKind,
        errors: Vec<ValidationError>,
    ) -> WizardError {
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        self.telemetry.emit(
            TelemetryEvent::new(VALIDATION_FAILED, draft_id.cloned(), Some(step), self.clock.as_ref())
                .with_attributes(json!({ "fields": fields })),
        );
        state.autosave = AutosaveStatus::Error {
            at: self.clock.now(),
            kind: "validation_error",
        };
        state.inline_errors.insert(step, errors.clone());
        WizardError::Validation(errors)
    }

    /// Records a failure after the network was involved. Local input is
    /// left as it was; a transient banner tells the user to retry.
    pub fn failed(
        &self,
        state: &mut WizardState,
        draft_id: Option<&DraftId>,
        step: StepKind,
        event: &'static str,
        error: &WizardError,
    ) {
        let now = self.clock.now();
        warn!(step = %step, kind = error.kind(), error = %error, "save failed");
        self.telemetry.emit(
            TelemetryEvent::new(event, draft_id.cloned(), Some(step), self.clock.as_ref())
                .with_attributes(json!({ "kind": error.kind() })),
        );
        state.autosave = AutosaveStatus::Error {
            at: now,
            kind: error.kind(),
        };
        state.notices.dismiss_kind(error.kind());
        state.notices.transient(
            error.kind(),
            error.user_message(),
            NoticeScope::Banner,
            now,
            self.notice_ttl,
        );
    }
}

fn touches(touched: &[String], field: &str) -> bool {
    touched.iter().any(|path| {
        field == path
            || field
                .strip_prefix(path.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    })
}
