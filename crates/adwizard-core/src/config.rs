//! Explicit configuration values handed to the wizard at construction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of photos the features/media step requires.
pub const DEFAULT_MIN_PHOTOS: usize = 3;

/// JPEG quality used when re-encoding photos to drop embedded metadata.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// How long a transient notice stays visible.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

/// Errors raised while reading configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value is missing.
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    /// A value is present but malformed.
    #[error("invalid configuration value for {key}: {reason}")]
    Invalid {
        /// Name of the offending setting.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Entry-point configuration for one wizard instance.
///
/// The module key selects the initial step sequence; the category schema
/// loaded at step 1 may replace it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Content module the wizard was opened for (e.g. `vehicle`).
    pub module_key: String,
    /// ISO country code the listing is created in.
    pub country: String,
    /// Media constraints for the features/media step.
    #[serde(default)]
    pub media: MediaPolicy,
    /// Lifetime of transient notices.
    #[serde(default = "default_notice_ttl", with = "duration_secs")]
    pub notice_ttl: Duration,
}

impl WizardConfig {
    /// Creates a configuration with the default media policy.
    #[must_use]
    pub fn new(module_key: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            module_key: module_key.into(),
            country: country.into(),
            media: MediaPolicy::default(),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    /// Replaces the media policy.
    #[must_use]
    pub fn with_media_policy(mut self, media: MediaPolicy) -> Self {
        self.media = media;
        self
    }
}

fn default_notice_ttl() -> Duration {
    DEFAULT_NOTICE_TTL
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Media constraints applied by the features/media step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPolicy {
    /// Photos required before the step can complete.
    pub min_photos: usize,
    /// Optional minimum pixel size; `None` disables the check.
    pub min_resolution: Option<Dimensions>,
    /// JPEG quality (1-100) for the metadata-stripping re-encode.
    pub jpeg_quality: u8,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            min_photos: DEFAULT_MIN_PHOTOS,
            min_resolution: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Creates a new size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both sides are at least as large as `minimum`.
    #[must_use]
    pub fn covers(self, minimum: Self) -> bool {
        self.width >= minimum.width && self.height >= minimum.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::Invalid {
            key: "dimensions",
            reason: format!("{reason}: {s:?}"),
        };
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| invalid("expected WIDTHxHEIGHT"))?;
        let width = w.trim().parse().map_err(|_| invalid("width is not a number"))?;
        let height = h.trim().parse().map_err(|_| invalid("height is not a number"))?;
        Ok(Self { width, height })
    }
}
