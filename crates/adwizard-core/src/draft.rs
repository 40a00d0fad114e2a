//! The draft listing resource and its partial patches.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(pub String);

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned identifier of an uploaded media object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub String);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content module family. Decides which step sequence applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Vehicles: brand, model and year taxonomy.
    Vehicle,
    /// Everything else (real estate, electronics, ...).
    Generic,
}

impl ModuleKind {
    /// Maps a module key to its family; anything but `vehicle` is generic.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        if key.trim().eq_ignore_ascii_case("vehicle") {
            Self::Vehicle
        } else {
            Self::Generic
        }
    }
}

/// Pricing mode of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    /// Fixed asking price.
    #[default]
    Fixed,
    /// Asking price open to offers.
    Negotiable,
    /// No price shown.
    OnRequest,
}

/// Price as committed to the draft. `amount` is the canonical numeric string
/// (dot decimal separator, fixed decimal places), never display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Pricing mode.
    #[serde(rename = "type")]
    pub price_type: PriceType,
    /// Canonical amount, absent for `on_request`.
    pub amount: Option<String>,
    /// ISO currency code.
    pub currency: String,
    /// Decimal places `amount` is rounded to.
    pub decimals: u8,
}

/// Postal address of the item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    /// Street and number.
    pub street: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// City.
    pub city: String,
}

/// How buyers may contact the seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPreferences {
    /// Show the seller's phone number on the listing.
    pub show_phone: bool,
    /// Accept in-platform messages.
    pub allow_messages: bool,
}

impl Default for ContactPreferences {
    fn default() -> Self {
        Self {
            show_phone: false,
            allow_messages: true,
        }
    }
}

/// Request body for allocating a new draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDraft {
    /// Category key picked at step 1.
    pub category: String,
    /// Module key derived from the category schema.
    pub module: String,
    /// Country the listing is created in.
    pub country: String,
}

/// Local mirror of the remote draft.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Draft {
    /// Assigned on first successful save; never changes afterwards.
    pub id: Option<DraftId>,
    /// Category key.
    pub category: String,
    /// Module key.
    pub module: String,
    /// Country code.
    pub country: String,
    /// Vehicle make.
    pub make_id: Option<String>,
    /// Vehicle model.
    pub model_id: Option<String>,
    /// Vehicle model year.
    pub year: Option<u16>,
    /// Vehicle trim.
    pub trim: Option<String>,
    /// Listing title.
    pub title: Option<String>,
    /// Listing description.
    pub description: Option<String>,
    /// Price.
    pub price: Option<Price>,
    /// Module-specific attributes keyed by schema field key.
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Selected feature keys.
    pub features: BTreeSet<String>,
    /// Item location.
    pub address: Option<Address>,
    /// Contact preferences.
    pub contact: Option<ContactPreferences>,
    /// Media in display order; the first entry is not necessarily the cover.
    pub media: Vec<MediaId>,
    /// Server id of the cover image.
    pub cover: Option<MediaId>,
}

impl Draft {
    /// Merges a server-accepted patch into the mirror.
    pub fn apply(&mut self, patch: &DraftPatch) {
        if let Some(category) = &patch.category {
            self.category.clone_from(category);
        }
        if let Some(make_id) = &patch.make_id {
            self.make_id = Some(make_id.clone());
        }
        if let Some(model_id) = &patch.model_id {
            self.model_id = Some(model_id.clone());
        }
        if let Some(year) = patch.year {
            self.year = Some(year);
        }
        if let Some(trim) = &patch.trim {
            self.trim = Some(trim.clone());
        }
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(price) = &patch.price {
            self.price = Some(price.clone());
        }
        for (key, value) in &patch.attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
        if let Some(features) = &patch.features {
            self.features.clone_from(features);
        }
        if let Some(address) = &patch.address {
            self.address = Some(address.clone());
        }
        if let Some(contact) = patch.contact {
            self.contact = Some(contact);
        }
    }
}

/// Partial update of a draft. Only `Some` fields (and present attribute keys)
/// are sent and applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftPatch {
    /// Category key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Vehicle make.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_id: Option<String>,
    /// Vehicle model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Vehicle model year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    /// Vehicle trim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    /// Listing title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Listing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// Module-specific attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Full replacement of the selected features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeSet<String>>,
    /// Item location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Contact preferences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactPreferences>,
}

impl DraftPatch {
    /// True when the patch carries no field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Field paths touched by this patch, in the same vocabulary the server
    /// uses for validation errors (`price_amount`, `attributes.mileage`, ...).
    #[must_use]
    pub fn field_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut push = |present: bool, path: &str| {
            if present {
                paths.push(path.to_owned());
            }
        };
        push(self.category.is_some(), "category");
        push(self.make_id.is_some(), "make_id");
        push(self.model_id.is_some(), "model_id");
        push(self.year.is_some(), "year");
        push(self.trim.is_some(), "trim");
        push(self.title.is_some(), "title");
        push(self.description.is_some(), "description");
        if self.price.is_some() {
            push(true, "price_type");
            push(true, "price_amount");
            push(true, "price_currency");
        }
        push(self.features.is_some(), "features");
        push(self.address.is_some(), "address");
        push(self.contact.is_some(), "contact");
        paths.extend(self.attributes.keys().map(|key| format!("attributes.{key}")));
        paths
    }
}
