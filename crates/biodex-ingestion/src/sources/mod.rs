//! Upstream species data clients.

pub mod backend;
pub mod catalog;

use async_trait::async_trait;
use serde_json::Value;

use biodex_common::Result;

pub use backend::{BackendClient, BackendConfig};
pub use catalog::{CatalogClient, CatalogConfig};

/// Single-item lookup against a species catalog by name.
#[async_trait]
pub trait SpeciesLookup: Send + Sync {
    /// Search by (scientific or common) name; returns raw catalog entries.
    async fn search_species(&self, name: &str, limit: usize) -> Result<Vec<Value>>;
}
