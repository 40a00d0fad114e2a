//! Environment configuration.

use std::time::Duration;

use adwizard_core::config::{ConfigError, Dimensions, MediaPolicy, WizardConfig};
use adwizard_http::{DEFAULT_TIMEOUT, HttpSettings};
use url::Url;

/// Settings read from `ADWIZARD_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Root of the listing service API.
    pub base_url: Url,
    /// Bearer token, if the service needs one.
    pub token: Option<String>,
    /// Module the wizard opens with.
    pub module_key: String,
    /// Country code listings are created in.
    pub country: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Minimum photo size, if enforced.
    pub min_resolution: Option<Dimensions>,
}

impl CliConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// See [`CliConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` without `ADWIZARD_BASE_URL` and
    /// `ConfigError::Invalid` for a value that does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_url = get("ADWIZARD_BASE_URL").ok_or(ConfigError::Missing("ADWIZARD_BASE_URL"))?;
        let base_url = Url::parse(raw_url.trim()).map_err(|e| ConfigError::Invalid {
            key: "ADWIZARD_BASE_URL",
            reason: e.to_string(),
        })?;

        let timeout = match get("ADWIZARD_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "ADWIZARD_TIMEOUT_SECS",
                        reason: format!("expected a positive number of seconds, got {raw:?}"),
                    });
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        let min_resolution = get("ADWIZARD_MIN_RESOLUTION")
            .map(|raw| {
                raw.parse::<Dimensions>().map_err(|err| ConfigError::Invalid {
                    key: "ADWIZARD_MIN_RESOLUTION",
                    reason: err.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            base_url,
            token: get("ADWIZARD_TOKEN"),
            module_key: get("ADWIZARD_MODULE").unwrap_or_else(|| "vehicle".to_owned()),
            country: get("ADWIZARD_COUNTRY").unwrap_or_else(|| "DE".to_owned()),
            timeout,
            min_resolution,
        })
    }

    /// Connection settings for the HTTP backend.
    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            timeout: self.timeout,
        }
    }

    /// Wizard configuration.
    #[must_use]
    pub fn wizard_config(&self) -> WizardConfig {
        WizardConfig::new(&self.module_key, &self.country).with_media_policy(MediaPolicy {
            min_resolution: self.min_resolution,
            ..MediaPolicy::default()
        })
    }
}
