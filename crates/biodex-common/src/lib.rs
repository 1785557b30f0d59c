//! biodex-common — Shared types, errors, and HTTP plumbing used across all Biodex crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod sandbox;
pub mod session;

// Re-export commonly used types
pub use entities::{MentionCandidate, SpeciesRecord, StrategyKind, TaxonId};
pub use error::{BiodexError, Result};
pub use session::{SessionHandler, StaticSession};
