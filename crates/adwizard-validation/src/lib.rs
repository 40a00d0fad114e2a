//! Adwizard Validation — local, pre-network checks for every wizard step.
//!
//! Validators are pure functions of the step form and the category schema.
//! On success they yield the normalised draft patch to send; on failure a
//! report whose errors follow document order.

pub mod forms;
pub mod numeric;
pub mod validators;

pub use forms::{
    AttributeInput, BrandForm, CategoryForm, CoreFieldsForm, FeaturesMediaForm, ModelForm,
    StepForm, YearTrimForm,
};
pub use numeric::{NormalizedNumber, NumberError, NumberLocale, normalize};
pub use validators::{ValidationReport, codes, validate_step};
