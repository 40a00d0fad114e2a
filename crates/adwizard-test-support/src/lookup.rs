//! In-memory schema and catalog lookups.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use adwizard_core::error::RemoteError;
use adwizard_schema::{CatalogLookup, Make, Model, SchemaLookup};
use async_trait::async_trait;

/// Serves schema payloads from a map; unknown categories answer 404.
#[derive(Debug, Default)]
pub struct StaticSchemaLookup {
    schemas: HashMap<String, serde_json::Value>,
    requested: Mutex<Vec<String>>,
}

impl StaticSchemaLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema payload for `category`.
    #[must_use]
    pub fn with(mut self, category: &str, payload: serde_json::Value) -> Self {
        self.schemas.insert(category.to_owned(), payload);
        self
    }

    /// Categories requested so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchemaLookup for StaticSchemaLookup {
    async fn schema_for(&self, category: &str) -> Result<serde_json::Value, RemoteError> {
        self.requested.lock().unwrap().push(category.to_owned());
        self.schemas
            .get(category)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                body: format!("unknown category {category}"),
            })
    }
}

/// Serves a fixed make/model catalog and can be switched offline.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    makes: Vec<Make>,
    models: HashMap<String, Vec<Model>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a make and its models.
    #[must_use]
    pub fn with_make(mut self, id: &str, name: &str, models: &[(&str, &str)]) -> Self {
        self.makes.push(Make {
            id: id.to_owned(),
            name: name.to_owned(),
        });
        self.models.insert(
            id.to_owned(),
            models
                .iter()
                .map(|(id, name)| Model {
                    id: (*id).to_owned(),
                    name: (*name).to_owned(),
                })
                .collect(),
        );
        self
    }

    /// Makes every following call fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of lookups received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("catalog unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogLookup for StaticCatalog {
    async fn makes(&self, _country: &str) -> Result<Vec<Make>, RemoteError> {
        self.check()?;
        Ok(self.makes.clone())
    }

    async fn models(&self, _country: &str, make_id: &str) -> Result<Vec<Model>, RemoteError> {
        self.check()?;
        Ok(self.models.get(make_id).cloned().unwrap_or_default())
    }
}
