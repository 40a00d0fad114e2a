//! Shared harness for wizard integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use adwizard_core::config::WizardConfig;
use adwizard_core::draft::Address;
use adwizard_media::{JpegReencoder, LocalFile};
use adwizard_test_support::fixtures::{generic_schema_json, jpeg_with_exif, vehicle_schema_json};
use adwizard_test_support::{
    FixedClock, RecordingTelemetry, ScriptedDraftApi, StaticCatalog, StaticSchemaLookup,
};
use adwizard_validation::{
    AttributeInput, BrandForm, CategoryForm, CoreFieldsForm, FeaturesMediaForm, ModelForm,
    StepForm, YearTrimForm,
};
use adwizard_wizard::{SaveOutcome, Wizard, WizardDeps};

pub struct Harness {
    pub wizard: Wizard,
    pub api: Arc<ScriptedDraftApi>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub catalog: Arc<StaticCatalog>,
    pub schemas: Arc<StaticSchemaLookup>,
}

pub fn harness(module_key: &str) -> Harness {
    let api = Arc::new(ScriptedDraftApi::new());
    let telemetry = Arc::new(RecordingTelemetry::default());
    let catalog = Arc::new(
        StaticCatalog::new()
            .with_make("bmw", "BMW", &[("320d", "320d"), ("x3", "X3")])
            .with_make("vw", "Volkswagen", &[("golf", "Golf")]),
    );
    let schemas = Arc::new(
        StaticSchemaLookup::new()
            .with("otomobil", vehicle_schema_json())
            .with("daire", generic_schema_json()),
    );
    let wizard = Wizard::new(
        WizardConfig::new(module_key, "DE"),
        WizardDeps {
            api: api.clone(),
            schemas: schemas.clone(),
            catalog: catalog.clone(),
            telemetry: telemetry.clone(),
            clock: Arc::new(FixedClock::default()),
            encoder: Arc::new(JpegReencoder),
        },
    );
    Harness {
        wizard,
        api,
        telemetry,
        catalog,
        schemas,
    }
}

pub fn category(key: &str) -> StepForm {
    StepForm::Category(CategoryForm {
        category: key.to_owned(),
    })
}

pub fn brand(make_id: &str) -> StepForm {
    StepForm::Brand(BrandForm {
        make_id: make_id.to_owned(),
    })
}

pub fn model(model_id: &str) -> StepForm {
    StepForm::Model(ModelForm {
        model_id: model_id.to_owned(),
    })
}

pub fn year(year: u16) -> StepForm {
    StepForm::YearTrim(YearTrimForm {
        year: Some(year),
        trim: Some("Touring".to_owned()),
    })
}

pub fn vehicle_core(price: &str) -> StepForm {
    let mut form = CoreFieldsForm {
        title: "BMW 320d Touring".to_owned(),
        description: "Well kept, full service history.".to_owned(),
        price_amount: price.to_owned(),
        address: Some(Address {
            street: None,
            postal_code: Some("10115".to_owned()),
            city: "Berlin".to_owned(),
        }),
        ..CoreFieldsForm::default()
    };
    form.attributes
        .insert("fuel".to_owned(), AttributeInput::Select("diesel".to_owned()));
    form.attributes
        .insert("mileage".to_owned(), AttributeInput::Number("120.000".to_owned()));
    StepForm::CoreFields(form)
}

pub fn flat_core() -> StepForm {
    let mut form = CoreFieldsForm {
        title: "Bright flat near the park".to_owned(),
        price_amount: "250.000".to_owned(),
        address: Some(Address {
            street: Some("Parkstrasse 1".to_owned()),
            postal_code: None,
            city: "Hamburg".to_owned(),
        }),
        ..CoreFieldsForm::default()
    };
    form.attributes
        .insert("rooms".to_owned(), AttributeInput::Number("3".to_owned()));
    StepForm::CoreFields(form)
}

pub fn features(keys: &[&str]) -> StepForm {
    StepForm::FeaturesMedia(FeaturesMediaForm {
        features: keys.iter().map(|k| (*k).to_owned()).collect(),
    })
}

pub fn photos(count: usize) -> Vec<LocalFile> {
    (0..count)
        .map(|i| LocalFile {
            file_name: format!("photo-{i}.jpg"),
            content_type: Some("image/jpeg".to_owned()),
            bytes: jpeg_with_exif(96, 64),
        })
        .collect()
}

/// Walks a vehicle wizard through steps 1..=4 with `next`.
pub async fn through_year(h: &Harness) {
    for form in [category("otomobil"), brand("bmw"), model("320d"), year(2019)] {
        let outcome = h.wizard.next(form).await.unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved { .. }));
    }
}

/// Walks a vehicle wizard to the review step.
pub async fn to_review(h: &Harness) {
    through_year(h).await;
    h.wizard.next(vehicle_core("18.500")).await.unwrap();
    h.wizard.add_media(photos(3)).unwrap();
    h.wizard.next(features(&["navigation"])).await.unwrap();
}
