//! Typed local form state for each step.

use std::collections::{BTreeMap, BTreeSet};

use adwizard_core::draft::{Address, ContactPreferences, PriceType};
use adwizard_core::step::StepKind;
use serde::{Deserialize, Serialize};

/// Step 1.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryForm {
    /// Selected category key.
    pub category: String,
}

/// Vehicle make selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrandForm {
    /// Selected make.
    pub make_id: String,
}

/// Vehicle model selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelForm {
    /// Selected model.
    pub model_id: String,
}

/// Vehicle year and trim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct YearTrimForm {
    /// Model year.
    pub year: Option<u16>,
    /// Trim name.
    #[serde(default)]
    pub trim: Option<String>,
}

/// Raw user input for one module attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeInput {
    /// Free text.
    Text(String),
    /// Number as typed, before normalisation.
    Number(String),
    /// Selected option.
    Select(String),
    /// Checkbox.
    Boolean(bool),
}

/// Core listing fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoreFieldsForm {
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Pricing mode.
    #[serde(default)]
    pub price_type: PriceType,
    /// Price as typed, in the user's locale.
    #[serde(default)]
    pub price_amount: String,
    /// Currency; defaults to the schema's first currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Module attribute inputs keyed by schema key.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeInput>,
    /// Item location.
    #[serde(default)]
    pub address: Option<Address>,
    /// Contact preferences.
    #[serde(default)]
    pub contact: ContactPreferences,
}

/// Feature selection. Photos are handled by the media pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeaturesMediaForm {
    /// Selected feature keys.
    #[serde(default)]
    pub features: BTreeSet<String>,
}

/// Local form state of whichever step is being saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepForm {
    /// Step 1.
    Category(CategoryForm),
    /// Vehicle make.
    Brand(BrandForm),
    /// Vehicle model.
    Model(ModelForm),
    /// Vehicle year and trim.
    YearTrim(YearTrimForm),
    /// Core fields.
    CoreFields(CoreFieldsForm),
    /// Features (and photos, handled elsewhere).
    FeaturesMedia(FeaturesMediaForm),
    /// Review has nothing to save.
    Review,
}

impl StepForm {
    /// Step this form belongs to.
    #[must_use]
    pub fn step(&self) -> StepKind {
        match self {
            Self::Category(_) => StepKind::Category,
            Self::Brand(_) => StepKind::Brand,
            Self::Model(_) => StepKind::Model,
            Self::YearTrim(_) => StepKind::YearTrim,
            Self::CoreFields(_) => StepKind::CoreFields,
            Self::FeaturesMedia(_) => StepKind::FeaturesMedia,
            Self::Review => StepKind::Review,
        }
    }
}
