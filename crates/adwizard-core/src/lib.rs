//! Adwizard Core — shared abstractions for the listing wizard.
//!
//! This crate defines the draft data model, the error taxonomy surfaced by
//! the coordinators, and the traits through which the wizard talks to its
//! remote collaborators. It contains no transport code.

pub mod clock;
pub mod config;
pub mod draft;
pub mod error;
pub mod remote;
pub mod step;
pub mod telemetry;
