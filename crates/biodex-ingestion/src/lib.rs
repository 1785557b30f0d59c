//! biodex-ingestion — Upstream species data.
//! - Backend REST API client (recommendation strategies, species search,
//!   interactions, feedback, insights)
//! - Public species catalog client (fallback source)
//! - Normalisation of heterogeneous payloads into `SpeciesRecord`
//! - Deduplication by taxon id

pub mod sources;
pub mod dedup;
pub mod models;
pub mod normalise;
