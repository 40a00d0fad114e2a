//! Coordinators that talk to the remote draft and drive the wizard state.

pub mod autosave;
pub mod media;
pub mod publish;
pub mod session;
pub mod wizard;
