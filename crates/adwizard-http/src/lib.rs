//! Adwizard HTTP — `reqwest` implementations of the remote collaborators.
//!
//! One [`HttpBackend`] talks to the listing service and implements the
//! draft API, the category schema lookup and the make/model catalog. Every
//! failure comes back as a `RemoteError`; mapping those to user-facing
//! errors is the wizard's job.

mod backend;
mod drafts;
mod lookups;

pub use backend::{ClientError, DEFAULT_TIMEOUT, HttpBackend, HttpSettings};
