//! Wizard step identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single page of the listing wizard.
///
/// Which of these appear, and in what order, depends on the content module;
/// see the step sequencer in `adwizard-wizard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Pick the category the listing belongs to.
    Category,
    /// Pick the vehicle make.
    Brand,
    /// Pick the vehicle model.
    Model,
    /// Pick the model year and optional trim.
    YearTrim,
    /// Title, description, price, module attributes, address and contact.
    CoreFields,
    /// Feature checkboxes and photos.
    FeaturesMedia,
    /// Read-only summary and publish.
    Review,
}

impl StepKind {
    /// Stable machine key used in telemetry and logs.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Brand => "brand",
            Self::Model => "model",
            Self::YearTrim => "year_trim",
            Self::CoreFields => "core_fields",
            Self::FeaturesMedia => "features_media",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
