//! Wall-clock source for the wizard.

use chrono::{DateTime, Utc};

/// Where the wizard reads "now" from: the autosave indicator's
/// last-saved time, notice expiry and telemetry timestamps.
///
/// Tests swap in a fixed instant so expiry is deterministic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
