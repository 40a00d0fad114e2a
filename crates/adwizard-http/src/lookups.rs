//! Category schema and make/model catalog endpoints.

use adwizard_core::error::RemoteError;
use adwizard_schema::{CatalogLookup, Make, Model, SchemaLookup};
use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use crate::backend::HttpBackend;

#[async_trait]
impl SchemaLookup for HttpBackend {
    #[instrument(skip(self))]
    async fn schema_for(&self, category: &str) -> Result<serde_json::Value, RemoteError> {
        let url = self.endpoint(&["categories", category, "schema"])?;
        self.send("category_schema", self.request(Method::GET, url))
            .await
    }
}

#[async_trait]
impl CatalogLookup for HttpBackend {
    #[instrument(skip(self))]
    async fn makes(&self, country: &str) -> Result<Vec<Make>, RemoteError> {
        let mut url = self.endpoint(&["catalog", "makes"])?;
        url.query_pairs_mut().append_pair("country", country);
        self.send("catalog_makes", self.request(Method::GET, url))
            .await
    }

    #[instrument(skip(self))]
    async fn models(&self, country: &str, make_id: &str) -> Result<Vec<Model>, RemoteError> {
        let mut url = self.endpoint(&["catalog", "models"])?;
        url.query_pairs_mut()
            .append_pair("country", country)
            .append_pair("make", make_id);
        self.send("catalog_models", self.request(Method::GET, url))
            .await
    }
}
