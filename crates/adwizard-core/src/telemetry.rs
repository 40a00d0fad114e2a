//! Telemetry events emitted by the coordinators.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::draft::DraftId;
use crate::step::StepKind;

/// A draft was allocated on the server.
pub const DRAFT_CREATED: &str = "draft_created";
/// A step's payload was accepted and the step marked complete.
pub const STEP_SAVED: &str = "step_saved";
/// A save was refused by local validation before any network call.
pub const VALIDATION_FAILED: &str = "validation_failed";
/// A save reached the network and failed.
pub const SAVE_FAILED: &str = "save_failed";
/// A media batch or reorder failed.
pub const MEDIA_UPLOAD_FAILED: &str = "media_upload_failed";
/// A late save reset completion flags ahead of the active step.
pub const PROGRESS_INVALIDATED: &str = "progress_invalidated";
/// The draft was published.
pub const PUBLISH_SUCCEEDED: &str = "publish_succeeded";
/// Publish came back with field-indexed errors.
pub const PUBLISH_REJECTED: &str = "publish_rejected";
/// Publish failed for any other reason.
pub const PUBLISH_FAILED: &str = "publish_failed";

/// Envelope for every telemetry event.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Event name (one of the constants in this module).
    pub name: &'static str,
    /// Draft the event concerns, once one exists.
    pub draft_id: Option<DraftId>,
    /// Step the event concerns.
    pub step: Option<StepKind>,
    /// When the event was produced.
    pub occurred_at: DateTime<Utc>,
    /// Free-form event attributes.
    pub attributes: serde_json::Value,
}

impl TelemetryEvent {
    /// Builds an event stamped with `clock`.
    #[must_use]
    pub fn new(
        name: &'static str,
        draft_id: Option<DraftId>,
        step: Option<StepKind>,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            name,
            draft_id,
            step,
            occurred_at: clock.now(),
            attributes: serde_json::Value::Null,
        }
    }

    /// Attaches attributes to the event.
    #[must_use]
    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Destination for telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Record one event. Must not block.
    fn emit(&self, event: TelemetryEvent);
}

/// Sink that turns every event into a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn emit(&self, event: TelemetryEvent) {
        tracing::info!(
            target: "adwizard::telemetry",
            event_id = %event.event_id,
            name = event.name,
            draft_id = event.draft_id.as_ref().map(tracing::field::display),
            step = event.step.map(StepKind::key),
            attributes = %event.attributes,
            "telemetry"
        );
    }
}
