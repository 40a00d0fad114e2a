//! The YAML listing script.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use adwizard_core::step::StepKind;
use adwizard_validation::{
    BrandForm, CategoryForm, CoreFieldsForm, FeaturesMediaForm, ModelForm, StepForm, YearTrimForm,
};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while reading or using a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Script or photo path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The script is not valid YAML for a listing.
    #[error("invalid listing script: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The category needs vehicle answers the script does not have.
    #[error("category {0} needs a `vehicle` section")]
    MissingVehicle(String),
}

/// Answers for the vehicle taxonomy steps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VehicleAnswers {
    /// Make id from the catalog.
    pub make: String,
    /// Model id from the catalog.
    pub model: String,
    /// Model year.
    pub year: u16,
    /// Trim name.
    #[serde(default)]
    pub trim: Option<String>,
}

/// One listing to enter, step by step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingScript {
    /// Category key for step 1.
    pub category: String,
    /// Needed when the category resolves to the vehicle module.
    #[serde(default)]
    pub vehicle: Option<VehicleAnswers>,
    /// Core listing fields.
    pub core: CoreFieldsForm,
    /// Feature keys to select.
    #[serde(default)]
    pub features: BTreeSet<String>,
    /// Photo files, relative to the script.
    #[serde(default)]
    pub photos: Vec<PathBuf>,
}

impl ListingScript {
    /// Parses a script.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Parse` for malformed YAML.
    pub fn from_yaml(text: &str) -> Result<Self, ScriptError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads and parses a script file. Photo paths are resolved against the
    /// script's directory.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Read` or `ScriptError::Parse`.
    pub async fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ScriptError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut script = Self::from_yaml(&text)?;
        if let Some(dir) = path.parent() {
            for photo in &mut script.photos {
                if photo.is_relative() {
                    *photo = dir.join(&*photo);
                }
            }
        }
        Ok(script)
    }

    /// Form to submit on `step`.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::MissingVehicle` for a vehicle step when the
    /// script has no vehicle answers.
    pub fn form_for(&self, step: StepKind) -> Result<StepForm, ScriptError> {
        let vehicle = || {
            self.vehicle
                .as_ref()
                .ok_or_else(|| ScriptError::MissingVehicle(self.category.clone()))
        };
        Ok(match step {
            StepKind::Category => StepForm::Category(CategoryForm {
                category: self.category.clone(),
            }),
            StepKind::Brand => StepForm::Brand(BrandForm {
                make_id: vehicle()?.make.clone(),
            }),
            StepKind::Model => StepForm::Model(ModelForm {
                model_id: vehicle()?.model.clone(),
            }),
            StepKind::YearTrim => {
                let answers = vehicle()?;
                StepForm::YearTrim(YearTrimForm {
                    year: Some(answers.year),
                    trim: answers.trim.clone(),
                })
            }
            StepKind::CoreFields => StepForm::CoreFields(self.core.clone()),
            StepKind::FeaturesMedia => StepForm::FeaturesMedia(FeaturesMediaForm {
                features: self.features.clone(),
            }),
            StepKind::Review => StepForm::Review,
        })
    }
}

#[cfg(test)]
mod tests {
    use adwizard_validation::AttributeInput;

    use super::*;

    const SCRIPT: &str = r#"
category: otomobil
vehicle:
  make: bmw
  model: 320d
  year: 2019
  trim: Touring
core:
  title: BMW 320d Touring
  price_amount: "18.500"
  attributes:
    fuel: { kind: select, value: diesel }
    mileage: { kind: number, value: "120.000" }
  address:
    city: Berlin
    postal_code: "10115"
features: [navigation, abs]
photos: [front.jpg, back.jpg, interior.jpg]
"#;

    #[test]
    fn test_script_parses_every_section() {
        let script = ListingScript::from_yaml(SCRIPT).unwrap();

        assert_eq!(script.category, "otomobil");
        assert_eq!(script.vehicle.as_ref().unwrap().year, 2019);
        assert_eq!(
            script.core.attributes["fuel"],
            AttributeInput::Select("diesel".into())
        );
        assert_eq!(script.core.address.as_ref().unwrap().city, "Berlin");
        assert_eq!(script.features.len(), 2);
        assert_eq!(script.photos.len(), 3);
    }

    #[test]
    fn test_form_for_maps_each_step() {
        let script = ListingScript::from_yaml(SCRIPT).unwrap();

        let brand = script.form_for(StepKind::Brand).unwrap();
        let year = script.form_for(StepKind::YearTrim).unwrap();

        assert_eq!(
            brand,
            StepForm::Brand(BrandForm {
                make_id: "bmw".into()
            })
        );
        assert_eq!(
            year,
            StepForm::YearTrim(YearTrimForm {
                year: Some(2019),
                trim: Some("Touring".into())
            })
        );
        assert_eq!(script.form_for(StepKind::Review).unwrap(), StepForm::Review);
    }

    #[test]
    fn test_vehicle_step_without_answers_is_an_error() {
        let script = ListingScript::from_yaml("category: daire\ncore:\n  title: Bright flat\n").unwrap();

        let result = script.form_for(StepKind::Model);

        assert!(matches!(result, Err(ScriptError::MissingVehicle(c)) if c == "daire"));
    }

    #[tokio::test]
    async fn test_load_resolves_photos_next_to_script() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("adwizard-script-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("listing.yaml");
        tokio::fs::write(&path, SCRIPT).await.unwrap();

        // Act
        let script = ListingScript::load(&path).await.unwrap();

        // Assert
        assert_eq!(script.photos[0], dir.join("front.jpg"));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
