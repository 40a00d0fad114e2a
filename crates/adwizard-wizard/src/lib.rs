//! Adwizard Wizard — orchestration of a multi-step listing wizard.
//!
//! Resolves the step sequence per content module, gates forward navigation
//! on completed steps, serialises saves through a single-flight lock, runs
//! the media pipeline against the remote draft and performs the final
//! publish.

pub mod application;
pub mod domain;

pub use application::wizard::{MediaIntake, Wizard, WizardDeps};
pub use application::autosave::SaveOutcome;
pub use application::publish::PublishOutcome;
pub use domain::state::{AutosaveStatus, Phase, WizardState};
