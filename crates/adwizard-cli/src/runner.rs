//! Drives one wizard run from a script.

use std::path::Path;
use std::sync::Arc;

use adwizard_core::clock::SystemClock;
use adwizard_core::config::ConfigError;
use adwizard_core::error::WizardError;
use adwizard_core::step::StepKind;
use adwizard_core::telemetry::TracingTelemetry;
use adwizard_http::{ClientError, HttpBackend};
use adwizard_media::{JpegReencoder, LocalFile};
use adwizard_wizard::{PublishOutcome, Wizard, WizardDeps};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::script::{ListingScript, ScriptError};

/// Anything that stops a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Environment configuration is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP backend could not be built.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The script could not be read or used.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// The wizard refused a step or the publish.
    #[error(transparent)]
    Wizard(#[from] WizardError),

    /// The wizard stopped advancing on a step.
    #[error("wizard did not leave step {0}")]
    Stuck(StepKind),
}

/// Reads configuration from the environment and runs `script_path` against
/// the configured backend.
///
/// # Errors
///
/// Returns the first error that stops the run.
pub async fn run_from_env(script_path: &Path) -> Result<String, RunError> {
    let config = CliConfig::from_env()?;
    let script = ListingScript::load(script_path).await?;
    let backend = Arc::new(HttpBackend::new(config.http_settings())?);
    info!(
        base_url = %backend.base_url(),
        module = %config.module_key,
        country = %config.country,
        "starting listing run"
    );

    let wizard = Wizard::new(
        config.wizard_config(),
        WizardDeps {
            api: backend.clone(),
            schemas: backend.clone(),
            catalog: backend,
            telemetry: Arc::new(TracingTelemetry),
            clock: Arc::new(SystemClock),
            encoder: Arc::new(JpegReencoder),
        },
    );
    let photos = read_photos(&script).await?;
    run_script(&wizard, &script, photos).await
}

/// Walks every step of `wizard` with the answers in `script`, attaches
/// `photos` on the features/media step and publishes. Returns the detail
/// URL of the published listing.
///
/// # Errors
///
/// Returns the wizard's error for the first step or publish that fails.
pub async fn run_script(
    wizard: &Wizard,
    script: &ListingScript,
    photos: Vec<LocalFile>,
) -> Result<String, RunError> {
    let mut photos = Some(photos);
    loop {
        let state = wizard.state();
        let Some(step) = state.current_step() else {
            return Err(RunError::Stuck(StepKind::Category));
        };
        if step == StepKind::Review {
            break;
        }

        match step {
            StepKind::Brand => match wizard.enter_brand_step().await {
                Ok(makes) => info!(makes = makes.len(), "catalog makes loaded"),
                Err(err) => warn!(error = %err, "catalog makes unavailable"),
            },
            StepKind::Model => match wizard.enter_model_step().await {
                Ok(models) => info!(models = models.len(), "catalog models loaded"),
                Err(err) => warn!(error = %err, "catalog models unavailable"),
            },
            StepKind::FeaturesMedia => {
                if let Some(files) = photos.take() {
                    let intake = wizard.add_media(files)?;
                    for rejected in &intake.rejected {
                        warn!(code = %rejected.code, message = %rejected.message, "photo refused");
                    }
                    info!(photos = intake.added.len(), "photos attached");
                }
            }
            _ => {}
        }

        wizard.next(script.form_for(step)?).await?;
        if wizard.state().current() == state.current() {
            return Err(RunError::Stuck(step));
        }
    }

    match wizard.publish().await? {
        PublishOutcome::Published { detail_url } => {
            info!(%detail_url, "listing published");
            Ok(detail_url)
        }
        PublishOutcome::InProgress => Err(RunError::Stuck(StepKind::Review)),
    }
}

async fn read_photos(script: &ListingScript) -> Result<Vec<LocalFile>, ScriptError> {
    let mut files = Vec::with_capacity(script.photos.len());
    for path in &script.photos {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ScriptError::Read {
                path: path.clone(),
                source,
            })?;
        files.push(LocalFile {
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            content_type: None,
            bytes,
        });
    }
    Ok(files)
}
