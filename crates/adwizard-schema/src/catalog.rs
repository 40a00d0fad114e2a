//! Read-only make/model catalog with time-to-live caching.

use std::sync::Arc;
use std::time::Duration;

use adwizard_core::error::RemoteError;
use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Makes are cached per country for 12 hours.
pub const MAKES_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Models are cached per country and make for 6 hours.
pub const MODELS_TTL: Duration = Duration::from_secs(6 * 60 * 60);

const MAX_CACHE_CAPACITY: u64 = 1_024;

/// A vehicle make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Make {
    /// Make identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A vehicle model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Remote make/model lookup.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Makes sold in `country`.
    async fn makes(&self, country: &str) -> Result<Vec<Make>, RemoteError>;

    /// Models of `make_id` sold in `country`.
    async fn models(&self, country: &str, make_id: &str) -> Result<Vec<Model>, RemoteError>;
}

/// Caching decorator around a [`CatalogLookup`].
///
/// `makes`/`models` answer from cache when they can. The `refresh_*` variants
/// always go to the network and only fall back to the cache when that fails.
#[derive(Clone)]
pub struct CachedCatalog {
    inner: Arc<dyn CatalogLookup>,
    makes: Cache<String, Arc<Vec<Make>>>,
    models: Cache<(String, String), Arc<Vec<Model>>>,
}

impl std::fmt::Debug for CachedCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCatalog")
            .field("makes", &self.makes.entry_count())
            .field("models", &self.models.entry_count())
            .finish_non_exhaustive()
    }
}

impl CachedCatalog {
    /// Wraps `inner` with the standard TTLs.
    #[must_use]
    pub fn new(inner: Arc<dyn CatalogLookup>) -> Self {
        Self::with_ttls(inner, MAKES_TTL, MODELS_TTL)
    }

    /// Wraps `inner` with explicit TTLs.
    #[must_use]
    pub fn with_ttls(inner: Arc<dyn CatalogLookup>, makes_ttl: Duration, models_ttl: Duration) -> Self {
        Self {
            inner,
            makes: Cache::builder()
                .max_capacity(MAX_CACHE_CAPACITY)
                .time_to_live(makes_ttl)
                .build(),
            models: Cache::builder()
                .max_capacity(MAX_CACHE_CAPACITY)
                .time_to_live(models_ttl)
                .build(),
        }
    }

    /// Fetches makes from the network and refreshes the cache.
    ///
    /// # Errors
    ///
    /// Returns the remote error only when the fetch fails and nothing is
    /// cached for `country`.
    pub async fn refresh_makes(&self, country: &str) -> Result<Arc<Vec<Make>>, RemoteError> {
        let key = country.to_ascii_uppercase();
        match self.inner.makes(&key).await {
            Ok(makes) => {
                let makes = Arc::new(makes);
                self.makes.insert(key, Arc::clone(&makes)).await;
                Ok(makes)
            }
            Err(err) => {
                warn!(country = %key, error = %err, "make refresh failed");
                self.makes.get(&key).await.ok_or(err)
            }
        }
    }

    /// Fetches models from the network and refreshes the cache.
    ///
    /// # Errors
    ///
    /// Returns the remote error only when the fetch fails and nothing is
    /// cached for the pair.
    pub async fn refresh_models(
        &self,
        country: &str,
        make_id: &str,
    ) -> Result<Arc<Vec<Model>>, RemoteError> {
        let key = (country.to_ascii_uppercase(), make_id.to_owned());
        match self.inner.models(&key.0, &key.1).await {
            Ok(models) => {
                let models = Arc::new(models);
                self.models.insert(key, Arc::clone(&models)).await;
                Ok(models)
            }
            Err(err) => {
                warn!(country = %key.0, make_id = %key.1, error = %err, "model refresh failed");
                self.models.get(&key).await.ok_or(err)
            }
        }
    }

    /// Makes for `country`, from cache when present.
    ///
    /// # Errors
    ///
    /// Returns the remote error on a cache miss whose fetch fails.
    pub async fn cached_makes(&self, country: &str) -> Result<Arc<Vec<Make>>, RemoteError> {
        let key = country.to_ascii_uppercase();
        if let Some(hit) = self.makes.get(&key).await {
            debug!(country = %key, "make cache hit");
            return Ok(hit);
        }
        self.refresh_makes(&key).await
    }

    /// Models for the pair, from cache when present.
    ///
    /// # Errors
    ///
    /// Returns the remote error on a cache miss whose fetch fails.
    pub async fn cached_models(
        &self,
        country: &str,
        make_id: &str,
    ) -> Result<Arc<Vec<Model>>, RemoteError> {
        let key = (country.to_ascii_uppercase(), make_id.to_owned());
        if let Some(hit) = self.models.get(&key).await {
            debug!(country = %key.0, make_id = %key.1, "model cache hit");
            return Ok(hit);
        }
        self.refresh_models(&key.0, &key.1).await
    }
}

#[async_trait]
impl CatalogLookup for CachedCatalog {
    async fn makes(&self, country: &str) -> Result<Vec<Make>, RemoteError> {
        self.cached_makes(country).await.map(|makes| makes.as_ref().clone())
    }

    async fn models(&self, country: &str, make_id: &str) -> Result<Vec<Model>, RemoteError> {
        self.cached_models(country, make_id)
            .await
            .map(|models| models.as_ref().clone())
    }
}
