//! Shared HTTP plumbing: base URL handling, auth and status mapping.

use std::time::Duration;

use adwizard_core::error::{RemoteError, ValidationError};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("adwizard/", env!("CARGO_PKG_VERSION"));

/// Errors raised while building a backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("base url {0} cannot be used for API requests")]
    BaseUrl(Url),

    /// The underlying HTTP client could not be created.
    #[error("http client could not be built: {0}")]
    Build(#[from] reqwest::Error),
}

/// Connection settings for the listing service.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Root of the API, e.g. `https://ads.example.com/api/v1`.
    pub base_url: Url,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpSettings {
    /// Settings without a token and with the default timeout.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Body of a 422 response.
#[derive(Debug, Deserialize)]
struct Rejection {
    validation_errors: Vec<ValidationError>,
}

/// Client for the listing service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBackend {
    /// Builds a backend from `settings`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::BaseUrl` for a base URL that cannot take path
    /// segments and `ClientError::Build` if the HTTP client fails to build.
    pub fn new(settings: HttpSettings) -> Result<Self, ClientError> {
        if settings.base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(settings.base_url));
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url,
            token: settings.token,
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded `segments` to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Transport(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends `builder` and decodes a JSON success body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = builder.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "request did not complete");
            RemoteError::Transport(e.to_string())
        })?;
        read_json(endpoint, response).await
    }
}

async fn read_json<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, RemoteError> {
    let status = response.status();
    if status.is_success() {
        debug!(endpoint, status = status.as_u16(), "request succeeded");
        return response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        if let Ok(rejection) = serde_json::from_str::<Rejection>(&body) {
            warn!(
                endpoint,
                errors = rejection.validation_errors.len(),
                "request rejected with field errors"
            );
            return Err(RemoteError::Rejected(rejection.validation_errors));
        }
    }
    warn!(endpoint, status = status.as_u16(), "request failed");
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(HttpSettings::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments_to_base_path() {
        let backend = backend("https://ads.example.test/api/v1/");

        let url = backend.endpoint(&["drafts", "d-1", "media"]).unwrap();

        assert_eq!(url.as_str(), "https://ads.example.test/api/v1/drafts/d-1/media");
    }

    #[test]
    fn test_endpoint_percent_encodes_segments() {
        let backend = backend("https://ads.example.test");

        let url = backend.endpoint(&["categories", "a/b c", "schema"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://ads.example.test/categories/a%2Fb%20c/schema"
        );
    }

    #[test]
    fn test_new_rejects_base_without_path() {
        let settings = HttpSettings::new(Url::parse("mailto:ads@example.test").unwrap());

        let result = HttpBackend::new(settings);

        assert!(matches!(result, Err(ClientError::BaseUrl(_))));
    }

    #[test]
    fn test_rejection_body_parses_field_errors() {
        let body = r#"{"validation_errors":[{"field":"price_amount","code":"OUT_OF_RANGE","message":"Too high"}]}"#;

        let rejection: Rejection = serde_json::from_str(body).unwrap();

        assert_eq!(rejection.validation_errors[0].field, "price_amount");
    }
}
