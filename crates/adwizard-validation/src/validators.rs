//! Per-step validators.

use adwizard_core::draft::{DraftPatch, Price, PriceType};
use adwizard_core::error::ValidationError;
use adwizard_schema::{CategorySchema, Condition, FieldKind, FieldSpec, TextRule};

use crate::forms::{AttributeInput, CoreFieldsForm, StepForm, YearTrimForm};
use crate::numeric::{NumberError, NumberLocale, normalize};

/// Error codes produced by local validation.
pub mod codes {
    /// A required value is missing.
    pub const REQUIRED: &str = "REQUIRED";
    /// Text shorter than the minimum.
    pub const TOO_SHORT: &str = "TOO_SHORT";
    /// Text longer than the maximum.
    pub const TOO_LONG: &str = "TOO_LONG";
    /// Number outside the declared range.
    pub const OUT_OF_RANGE: &str = "OUT_OF_RANGE";
    /// Input could not be read as a number.
    pub const INVALID_NUMBER: &str = "INVALID_NUMBER";
    /// Value not among the declared options.
    pub const INVALID_OPTION: &str = "INVALID_OPTION";
    /// Input for an attribute the schema does not declare.
    pub const UNKNOWN_FIELD: &str = "UNKNOWN_FIELD";
    /// Input kind differs from the declared kind.
    pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
    /// The step needs a category schema that is not loaded.
    pub const SCHEMA_UNAVAILABLE: &str = "SCHEMA_UNAVAILABLE";
}

/// Validation errors of one step, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// True when nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors in document order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consumes the report.
    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// The field the UI scrolls into focus: the first error in document
    /// order.
    #[must_use]
    pub fn focus_target(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    fn push(&mut self, field: impl Into<String>, code: &str, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, code, message));
    }

    fn finish(self, patch: DraftPatch) -> Result<DraftPatch, Self> {
        if self.errors.is_empty() {
            Ok(patch)
        } else {
            Err(self)
        }
    }
}

/// Validates one step's form and returns the normalised patch to send.
///
/// `schema` may be `None` only for the category step, which is what loads it.
///
/// # Errors
///
/// Returns a `ValidationReport` with every failure, ordered as the fields
/// appear on the page.
pub fn validate_step(
    form: &StepForm,
    schema: Option<&CategorySchema>,
    locale: NumberLocale,
) -> Result<DraftPatch, ValidationReport> {
    let mut report = ValidationReport::default();
    let mut patch = DraftPatch::default();

    match form {
        StepForm::Category(form) => {
            let category = form.category.trim();
            if category.is_empty() {
                report.push("category", codes::REQUIRED, "Please choose a category.");
            } else {
                patch.category = Some(category.to_owned());
            }
        }
        StepForm::Brand(form) => {
            let make_id = form.make_id.trim();
            if make_id.is_empty() {
                report.push("make_id", codes::REQUIRED, "Please choose a make.");
            } else {
                patch.make_id = Some(make_id.to_owned());
            }
        }
        StepForm::Model(form) => {
            let model_id = form.model_id.trim();
            if model_id.is_empty() {
                report.push("model_id", codes::REQUIRED, "Please choose a model.");
            } else {
                patch.model_id = Some(model_id.to_owned());
            }
        }
        StepForm::YearTrim(form) => match schema {
            Some(schema) => validate_year_trim(form, schema, &mut report, &mut patch),
            None => schema_unavailable("year", &mut report),
        },
        StepForm::CoreFields(form) => match schema {
            Some(schema) => validate_core_fields(form, schema, locale, &mut report, &mut patch),
            None => schema_unavailable("title", &mut report),
        },
        StepForm::FeaturesMedia(form) => match schema {
            Some(schema) => {
                let unknown: Vec<&str> = form
                    .features
                    .iter()
                    .filter(|feature| !schema.offers_feature(feature))
                    .map(String::as_str)
                    .collect();
                if unknown.is_empty() {
                    patch.features = Some(form.features.clone());
                } else {
                    report.push(
                        "features",
                        codes::INVALID_OPTION,
                        format!("Unknown features: {}.", unknown.join(", ")),
                    );
                }
            }
            None => schema_unavailable("features", &mut report),
        },
        StepForm::Review => {}
    }

    report.finish(patch)
}

fn schema_unavailable(field: &str, report: &mut ValidationReport) {
    report.push(
        field,
        codes::SCHEMA_UNAVAILABLE,
        "Category details are not loaded yet.",
    );
}

fn validate_year_trim(
    form: &YearTrimForm,
    schema: &CategorySchema,
    report: &mut ValidationReport,
    patch: &mut DraftPatch,
) {
    let Some(taxonomy) = schema.vehicle_taxonomy() else {
        schema_unavailable("year", report);
        return;
    };
    match form.year {
        None => report.push("year", codes::REQUIRED, "Please choose the model year."),
        Some(year) if year < taxonomy.year_min || year > taxonomy.year_max => report.push(
            "year",
            codes::OUT_OF_RANGE,
            format!(
                "Model year must be between {} and {}.",
                taxonomy.year_min, taxonomy.year_max
            ),
        ),
        Some(year) => patch.year = Some(year),
    }
    let trim = form.trim.as_deref().map(str::trim).filter(|t| !t.is_empty());
    match trim {
        Some(trim) => patch.trim = Some(trim.to_owned()),
        None if taxonomy.trim_required => {
            report.push("trim", codes::REQUIRED, "Please choose a trim.");
        }
        None => {}
    }
}

fn validate_core_fields(
    form: &CoreFieldsForm,
    schema: &CategorySchema,
    locale: NumberLocale,
    report: &mut ValidationReport,
    patch: &mut DraftPatch,
) {
    let rules = &schema.core;

    if let Some(title) = check_text("title", "Title", &form.title, rules.title, report) {
        patch.title = Some(title);
    }
    if let Some(description) = check_text(
        "description",
        "Description",
        &form.description,
        rules.description,
        report,
    ) {
        patch.description = Some(description);
    }

    let price_rule = &rules.price;
    let amount = if form.price_type == PriceType::OnRequest {
        Some(None)
    } else if form.price_amount.trim().is_empty() {
        if price_rule.required {
            report.push("price_amount", codes::REQUIRED, "Please enter a price.");
            None
        } else {
            Some(None)
        }
    } else {
        match normalize(&form.price_amount, price_rule.decimals, locale) {
            Ok(number) => {
                let value = number.as_f64();
                if out_of_range(value, price_rule.min, price_rule.max) {
                    report.push(
                        "price_amount",
                        codes::OUT_OF_RANGE,
                        range_message("Price", price_rule.min, price_rule.max),
                    );
                    None
                } else {
                    Some(Some(number.canonical))
                }
            }
            Err(err) => {
                report.push("price_amount", codes::INVALID_NUMBER, number_message("Price", &err));
                None
            }
        }
    };
    let currency = form
        .currency
        .clone()
        .or_else(|| price_rule.currencies.first().cloned())
        .unwrap_or_default();
    let currency_ok = price_rule.currencies.iter().any(|c| *c == currency);
    if !currency_ok {
        report.push(
            "price_currency",
            codes::INVALID_OPTION,
            format!("Currency {currency} is not accepted here."),
        );
    }
    if let (Some(amount), true) = (amount, currency_ok) {
        patch.price = Some(Price {
            price_type: form.price_type,
            amount,
            currency,
            decimals: price_rule.decimals,
        });
    }

    for spec in schema.attributes() {
        if let Some(value) = check_attribute(spec, schema.attributes(), form, locale, report) {
            patch.attributes.insert(spec.key.clone(), value);
        }
    }
    for key in form.attributes.keys() {
        if !schema.attributes().iter().any(|spec| spec.key == *key) {
            report.push(
                format!("attributes.{key}"),
                codes::UNKNOWN_FIELD,
                format!("{key} does not apply to this category."),
            );
        }
    }

    let city_missing = form
        .address
        .as_ref()
        .is_none_or(|address| address.city.trim().is_empty());
    if rules.address_required && city_missing {
        report.push("address.city", codes::REQUIRED, "Please enter the city.");
    } else if !city_missing {
        patch.address.clone_from(&form.address);
    }

    patch.contact = Some(form.contact);
}

fn check_text(
    field: &str,
    label: &str,
    raw: &str,
    rule: TextRule,
    report: &mut ValidationReport,
) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        if rule.required {
            report.push(field, codes::REQUIRED, format!("{label} is required."));
        }
        return None;
    }
    let len = value.chars().count();
    if let Some(min) = rule.min_len.filter(|min| len < *min) {
        report.push(
            field,
            codes::TOO_SHORT,
            format!("{label} must be at least {min} characters."),
        );
        return None;
    }
    if let Some(max) = rule.max_len.filter(|max| len > *max) {
        report.push(
            field,
            codes::TOO_LONG,
            format!("{label} must be at most {max} characters."),
        );
        return None;
    }
    Some(value.to_owned())
}

fn check_attribute(
    spec: &FieldSpec,
    specs: &[FieldSpec],
    form: &CoreFieldsForm,
    locale: NumberLocale,
    report: &mut ValidationReport,
) -> Option<serde_json::Value> {
    let field = format!("attributes.{}", spec.key);
    let required = spec.required
        || spec
            .required_when
            .as_ref()
            .is_some_and(|condition| condition_met(condition, specs, form, locale));

    let input = form.attributes.get(&spec.key).filter(|input| !is_blank(input));
    let Some(input) = input else {
        if required {
            report.push(field, codes::REQUIRED, format!("{} is required.", spec.label));
        }
        return None;
    };

    match (spec.kind, input) {
        (FieldKind::Number, AttributeInput::Number(raw)) => match normalize(raw, spec.decimals, locale) {
            Ok(number) if out_of_range(number.as_f64(), spec.min, spec.max) => {
                report.push(
                    field,
                    codes::OUT_OF_RANGE,
                    range_message(&spec.label, spec.min, spec.max),
                );
                None
            }
            Ok(number) => Some(serde_json::Value::String(number.canonical)),
            Err(err) => {
                report.push(field, codes::INVALID_NUMBER, number_message(&spec.label, &err));
                None
            }
        },
        (FieldKind::Text, AttributeInput::Text(text)) => {
            let rule = TextRule {
                required,
                min_len: spec.min.map(length_bound),
                max_len: spec.max.map(length_bound),
            };
            check_text(&field, &spec.label, text, rule, report).map(serde_json::Value::String)
        }
        (FieldKind::Select, AttributeInput::Select(choice)) => {
            if spec.options.iter().any(|option| option == choice) {
                Some(serde_json::Value::String(choice.clone()))
            } else {
                report.push(
                    field,
                    codes::INVALID_OPTION,
                    format!("{choice} is not a valid {}.", spec.label),
                );
                None
            }
        }
        (FieldKind::Boolean, AttributeInput::Boolean(flag)) => Some(serde_json::Value::Bool(*flag)),
        _ => {
            report.push(
                field,
                codes::TYPE_MISMATCH,
                format!("{} has the wrong kind of value.", spec.label),
            );
            None
        }
    }
}

fn is_blank(input: &AttributeInput) -> bool {
    match input {
        AttributeInput::Text(s) | AttributeInput::Number(s) | AttributeInput::Select(s) => {
            s.trim().is_empty()
        }
        AttributeInput::Boolean(_) => false,
    }
}

/// Numbers are compared by value after normalising with the controlling
/// field's decimals, so `"4"`, `"4,0"` and `4` all match `equals: 4`.
fn condition_met(
    condition: &Condition,
    specs: &[FieldSpec],
    form: &CoreFieldsForm,
    locale: NumberLocale,
) -> bool {
    let Some(input) = form.attributes.get(&condition.field) else {
        return false;
    };
    match input {
        AttributeInput::Number(raw) => {
            let decimals = specs
                .iter()
                .find(|spec| spec.key == condition.field)
                .map_or(0, |spec| spec.decimals);
            let Ok(actual) = normalize(raw, decimals, locale) else {
                return false;
            };
            let expected = match &condition.equals {
                serde_json::Value::Number(expected) => expected.to_string(),
                serde_json::Value::String(expected) => expected.clone(),
                _ => return false,
            };
            normalize(&expected, decimals, NumberLocale::DOT_DECIMAL)
                .is_ok_and(|expected| expected.minor_units == actual.minor_units)
        }
        AttributeInput::Text(text) | AttributeInput::Select(text) => {
            condition.equals.as_str() == Some(text.trim())
        }
        AttributeInput::Boolean(flag) => condition.equals.as_bool() == Some(*flag),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn length_bound(bound: f64) -> usize {
    bound.max(0.0) as usize
}

fn out_of_range(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_some_and(|min| value < min) || max.is_some_and(|max| value > max)
}

fn range_message(label: &str, min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{label} must be between {min} and {max}."),
        (Some(min), None) => format!("{label} must be at least {min}."),
        (None, Some(max)) => format!("{label} must be at most {max}."),
        (None, None) => format!("{label} is out of range."),
    }
}

fn number_message(label: &str, err: &NumberError) -> String {
    match err {
        NumberError::Empty | NumberError::Malformed => format!("{label} must be a number."),
        NumberError::TooLarge => format!("{label} is too large."),
    }
}
