//! Adwizard Schema — category schemas and the make/model catalog.
//!
//! A category schema decides which step sequence applies and what every
//! step validates. Schemas are checked once when loaded so later code can
//! rely on their shape.

pub mod catalog;
pub mod schema;

pub use catalog::{CachedCatalog, CatalogLookup, Make, Model};
pub use schema::{
    CategorySchema, Condition, CoreFieldRules, FeatureGroup, FieldKind, FieldSpec, ModuleSchema,
    PriceRule, SchemaError, SchemaLoadError, SchemaLookup, TextRule, VehicleTaxonomy, load_schema,
};
