//! Shared test doubles and fixtures for the listing wizard.

mod clock;
mod draft_api;
pub mod fixtures;
mod lookup;
mod telemetry;

pub use clock::FixedClock;
pub use draft_api::{DraftApiCall, FailingDraftApi, ScriptedDraftApi};
pub use lookup::{StaticCatalog, StaticSchemaLookup};
pub use telemetry::RecordingTelemetry;
