//! Per-category field schema, tagged by content module.

use std::collections::HashSet;

use adwizard_core::draft::ModuleKind;
use adwizard_core::error::RemoteError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of decimal places a numeric field may declare.
pub const MAX_DECIMALS: u8 = 6;

/// Declared input kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Numeric input, normalised before storage.
    Number,
    /// One value out of `options`.
    Select,
    /// Checkbox.
    Boolean,
}

/// Makes a field required only while another attribute holds a given value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Attribute key the condition reads.
    pub field: String,
    /// Value that activates the requirement.
    pub equals: serde_json::Value,
}

/// One module-specific attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Attribute key, unique within the schema.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Input kind.
    pub kind: FieldKind,
    /// Always required.
    #[serde(default)]
    pub required: bool,
    /// Required while the condition holds.
    #[serde(default)]
    pub required_when: Option<Condition>,
    /// Lower bound (value for numbers, length for text).
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound (value for numbers, length for text).
    #[serde(default)]
    pub max: Option<f64>,
    /// Fixed decimal places for numbers.
    #[serde(default)]
    pub decimals: u8,
    /// Allowed values for selects.
    #[serde(default)]
    pub options: Vec<String>,
}

/// A named group of optional feature checkboxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGroup {
    /// Group key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Feature keys in the group.
    pub options: Vec<String>,
}

/// Length rule for a core text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextRule {
    /// Must be non-empty.
    #[serde(default)]
    pub required: bool,
    /// Minimum length in characters.
    #[serde(default)]
    pub min_len: Option<usize>,
    /// Maximum length in characters.
    #[serde(default)]
    pub max_len: Option<usize>,
}

/// Rule for the price core field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    /// An amount is required unless the price type is `on_request`.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Minimum amount.
    #[serde(default)]
    pub min: Option<f64>,
    /// Maximum amount.
    #[serde(default)]
    pub max: Option<f64>,
    /// Decimal places amounts are rounded to.
    #[serde(default = "default_price_decimals")]
    pub decimals: u8,
    /// Accepted currencies; the first one is the default.
    pub currencies: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_price_decimals() -> u8 {
    2
}

/// Rules for the fields every listing has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreFieldRules {
    /// Title rule.
    pub title: TextRule,
    /// Description rule.
    #[serde(default)]
    pub description: TextRule,
    /// Price rule.
    pub price: PriceRule,
    /// Whether a city must be given.
    #[serde(default)]
    pub address_required: bool,
}

/// Vehicle taxonomy constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleTaxonomy {
    /// Oldest selectable model year.
    pub year_min: u16,
    /// Newest selectable model year.
    pub year_max: u16,
    /// Whether a trim must be picked.
    #[serde(default)]
    pub trim_required: bool,
}

/// Module-tagged part of a category schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "snake_case")]
pub enum ModuleSchema {
    /// Vehicle categories carry brand/model/year taxonomy.
    Vehicle {
        /// Year and trim constraints.
        taxonomy: VehicleTaxonomy,
        /// Module attributes, in document order.
        #[serde(default)]
        attributes: Vec<FieldSpec>,
        /// Feature groups.
        #[serde(default)]
        feature_groups: Vec<FeatureGroup>,
    },
    /// Every other category.
    Generic {
        /// Module key as known to the server (e.g. `real_estate`).
        module_key: String,
        /// Module attributes, in document order.
        #[serde(default)]
        attributes: Vec<FieldSpec>,
        /// Feature groups.
        #[serde(default)]
        feature_groups: Vec<FeatureGroup>,
    },
}

/// Complete schema for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySchema {
    /// Category key.
    pub category: String,
    /// Core field rules.
    pub core: CoreFieldRules,
    /// Module-specific part.
    #[serde(flatten)]
    pub module: ModuleSchema,
}

/// Defects found while validating a schema at load time.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    /// The payload did not parse.
    #[error("schema payload is malformed: {0}")]
    Malformed(String),

    /// The category key is empty.
    #[error("schema has an empty category key")]
    EmptyCategory,

    /// Two attributes share a key.
    #[error("attribute {0} is declared more than once")]
    DuplicateField(String),

    /// A bound pair is inverted.
    #[error("field {field} has min {min} greater than max {max}")]
    InvalidRange {
        /// Offending field.
        field: String,
        /// Declared minimum.
        min: f64,
        /// Declared maximum.
        max: f64,
    },

    /// A select field has nothing to select.
    #[error("select field {0} declares no options")]
    SelectWithoutOptions(String),

    /// Too many decimal places.
    #[error("field {field} declares {decimals} decimals (max {MAX_DECIMALS})")]
    DecimalsTooLarge {
        /// Offending field.
        field: String,
        /// Declared decimals.
        decimals: u8,
    },

    /// A conditional requirement points at an unknown attribute.
    #[error("field {field} depends on unknown attribute {depends_on}")]
    UnknownConditionField {
        /// Field carrying the condition.
        field: String,
        /// Missing attribute key.
        depends_on: String,
    },

    /// A feature group has no options.
    #[error("feature group {0} declares no options")]
    EmptyFeatureGroup(String),

    /// The price rule accepts no currency.
    #[error("price rule declares no currency")]
    NoCurrencies,

    /// The vehicle year range is inverted.
    #[error("vehicle year range {min}..={max} is empty")]
    InvalidYearRange {
        /// Oldest year.
        min: u16,
        /// Newest year.
        max: u16,
    },
}

impl CategorySchema {
    /// Parses and validates a schema payload.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Malformed` if the payload does not parse, or the
    /// first structural defect found by [`CategorySchema::validate`].
    pub fn from_json(value: serde_json::Value) -> Result<Self, SchemaError> {
        let schema: Self =
            serde_json::from_value(value).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Module family this schema belongs to.
    #[must_use]
    pub fn module_kind(&self) -> ModuleKind {
        match self.module {
            ModuleSchema::Vehicle { .. } => ModuleKind::Vehicle,
            ModuleSchema::Generic { .. } => ModuleKind::Generic,
        }
    }

    /// Module key sent to the server when the draft is created.
    #[must_use]
    pub fn module_key(&self) -> &str {
        match &self.module {
            ModuleSchema::Vehicle { .. } => "vehicle",
            ModuleSchema::Generic { module_key, .. } => module_key,
        }
    }

    /// Module attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[FieldSpec] {
        match &self.module {
            ModuleSchema::Vehicle { attributes, .. } | ModuleSchema::Generic { attributes, .. } => {
                attributes
            }
        }
    }

    /// Feature groups in document order.
    #[must_use]
    pub fn feature_groups(&self) -> &[FeatureGroup] {
        match &self.module {
            ModuleSchema::Vehicle { feature_groups, .. }
            | ModuleSchema::Generic { feature_groups, .. } => feature_groups,
        }
    }

    /// Vehicle taxonomy, if this is a vehicle schema.
    #[must_use]
    pub fn vehicle_taxonomy(&self) -> Option<&VehicleTaxonomy> {
        match &self.module {
            ModuleSchema::Vehicle { taxonomy, .. } => Some(taxonomy),
            ModuleSchema::Generic { .. } => None,
        }
    }

    /// True when `feature` is offered by any feature group.
    #[must_use]
    pub fn offers_feature(&self, feature: &str) -> bool {
        self.feature_groups()
            .iter()
            .any(|group| group.options.iter().any(|option| option == feature))
    }

    /// Checks the schema's internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaError` found, checking core rules, then the
    /// vehicle taxonomy, then attributes and feature groups in document order.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.category.trim().is_empty() {
            return Err(SchemaError::EmptyCategory);
        }

        let price = &self.core.price;
        if price.currencies.is_empty() {
            return Err(SchemaError::NoCurrencies);
        }
        check_range("price_amount", price.min, price.max)?;
        check_decimals("price_amount", price.decimals)?;
        for (field, rule) in [("title", &self.core.title), ("description", &self.core.description)]
        {
            #[allow(clippy::cast_precision_loss)]
            check_range(
                field,
                rule.min_len.map(|v| v as f64),
                rule.max_len.map(|v| v as f64),
            )?;
        }

        if let Some(taxonomy) = self.vehicle_taxonomy() {
            if taxonomy.year_min > taxonomy.year_max {
                return Err(SchemaError::InvalidYearRange {
                    min: taxonomy.year_min,
                    max: taxonomy.year_max,
                });
            }
        }

        let mut seen = HashSet::new();
        for spec in self.attributes() {
            if !seen.insert(spec.key.as_str()) {
                return Err(SchemaError::DuplicateField(spec.key.clone()));
            }
            check_range(&spec.key, spec.min, spec.max)?;
            check_decimals(&spec.key, spec.decimals)?;
            if spec.kind == FieldKind::Select && spec.options.is_empty() {
                return Err(SchemaError::SelectWithoutOptions(spec.key.clone()));
            }
        }
        for spec in self.attributes() {
            if let Some(condition) = &spec.required_when {
                if !seen.contains(condition.field.as_str()) {
                    return Err(SchemaError::UnknownConditionField {
                        field: spec.key.clone(),
                        depends_on: condition.field.clone(),
                    });
                }
            }
        }

        for group in self.feature_groups() {
            if group.options.is_empty() {
                return Err(SchemaError::EmptyFeatureGroup(group.key.clone()));
            }
        }
        Ok(())
    }
}

fn check_range(field: &str, min: Option<f64>, max: Option<f64>) -> Result<(), SchemaError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(SchemaError::InvalidRange {
            field: field.to_owned(),
            min,
            max,
        }),
        _ => Ok(()),
    }
}

fn check_decimals(field: &str, decimals: u8) -> Result<(), SchemaError> {
    if decimals > MAX_DECIMALS {
        return Err(SchemaError::DecimalsTooLarge {
            field: field.to_owned(),
            decimals,
        });
    }
    Ok(())
}

/// Remote collaborator returning the schema of a category.
#[async_trait]
pub trait SchemaLookup: Send + Sync {
    /// Fetch the raw schema payload for `category`.
    async fn schema_for(&self, category: &str) -> Result<serde_json::Value, RemoteError>;
}

/// Failure to obtain a usable schema.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaLoadError {
    /// The lookup call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The payload failed validation.
    #[error(transparent)]
    Invalid(#[from] SchemaError),
}

/// Fetches and validates the schema for `category`.
///
/// # Errors
///
/// Returns `SchemaLoadError::Remote` if the lookup fails and
/// `SchemaLoadError::Invalid` if the payload is not a consistent schema.
pub async fn load_schema(
    lookup: &dyn SchemaLookup,
    category: &str,
) -> Result<CategorySchema, SchemaLoadError> {
    let payload = lookup.schema_for(category).await?;
    let schema = CategorySchema::from_json(payload)?;
    tracing::debug!(category, module = schema.module_key(), "category schema loaded");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vehicle_payload() -> serde_json::Value {
        json!({
            "category": "otomobil",
            "module": "vehicle",
            "core": {
                "title": { "required": true, "min_len": 5, "max_len": 80 },
                "price": { "min": 100.0, "max": 10000000.0, "currencies": ["EUR"] }
            },
            "taxonomy": { "year_min": 1950, "year_max": 2027, "trim_required": false },
            "attributes": [
                { "key": "fuel", "label": "Fuel", "kind": "select", "required": true,
                  "options": ["petrol", "diesel", "electric"] },
                { "key": "battery_kwh", "label": "Battery", "kind": "number",
                  "required_when": { "field": "fuel", "equals": "electric" },
                  "min": 1.0, "max": 300.0, "decimals": 1 }
            ],
            "feature_groups": [
                { "key": "comfort", "label": "Comfort", "options": ["heated_seats", "sunroof"] }
            ]
        })
    }

    #[test]
    fn test_from_json_parses_tagged_vehicle_schema() {
        // Act
        let schema = CategorySchema::from_json(vehicle_payload()).unwrap();

        // Assert
        assert_eq!(schema.module_kind(), ModuleKind::Vehicle);
        assert_eq!(schema.module_key(), "vehicle");
        assert_eq!(schema.attributes().len(), 2);
        assert_eq!(schema.core.price.decimals, 2);
        assert!(schema.core.price.required);
        assert!(schema.offers_feature("sunroof"));
        assert!(!schema.offers_feature("towbar"));
    }

    #[test]
    fn test_from_json_parses_generic_schema_with_module_key() {
        let payload = json!({
            "category": "daire",
            "module": "generic",
            "module_key": "real_estate",
            "core": {
                "title": { "required": true },
                "price": { "currencies": ["TRY", "EUR"], "decimals": 0 }
            }
        });

        let schema = CategorySchema::from_json(payload).unwrap();

        assert_eq!(schema.module_kind(), ModuleKind::Generic);
        assert_eq!(schema.module_key(), "real_estate");
        assert!(schema.vehicle_taxonomy().is_none());
        assert!(schema.attributes().is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_attribute_keys() {
        let mut payload = vehicle_payload();
        payload["attributes"][1]["key"] = json!("fuel");
        payload["attributes"][1]["required_when"] = serde_json::Value::Null;

        let result = CategorySchema::from_json(payload);

        assert_eq!(result, Err(SchemaError::DuplicateField("fuel".into())));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut payload = vehicle_payload();
        payload["core"]["price"]["min"] = json!(500.0);
        payload["core"]["price"]["max"] = json!(10.0);

        let result = CategorySchema::from_json(payload);

        assert!(matches!(result, Err(SchemaError::InvalidRange { field, .. }) if field == "price_amount"));
    }

    #[test]
    fn test_validate_rejects_select_without_options() {
        let mut payload = vehicle_payload();
        payload["attributes"][0]["options"] = json!([]);

        let result = CategorySchema::from_json(payload);

        assert_eq!(result, Err(SchemaError::SelectWithoutOptions("fuel".into())));
    }

    #[test]
    fn test_validate_rejects_condition_on_unknown_attribute() {
        let mut payload = vehicle_payload();
        payload["attributes"][1]["required_when"]["field"] = json!("gearbox");

        let result = CategorySchema::from_json(payload);

        assert!(matches!(
            result,
            Err(SchemaError::UnknownConditionField { depends_on, .. }) if depends_on == "gearbox"
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_year_range() {
        let mut payload = vehicle_payload();
        payload["taxonomy"]["year_min"] = json!(2030);

        let result = CategorySchema::from_json(payload);

        assert_eq!(
            result,
            Err(SchemaError::InvalidYearRange {
                min: 2030,
                max: 2027
            })
        );
    }

    #[test]
    fn test_from_json_reports_malformed_payload() {
        let result = CategorySchema::from_json(json!({ "category": "x", "module": "boat" }));
        assert!(matches!(result, Err(SchemaError::Malformed(_))));
    }
}
