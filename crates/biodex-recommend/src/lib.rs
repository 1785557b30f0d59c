//! biodex-recommend — Species recommendation pipeline.
//!
//! - `strategy`: one call per recommendation strategy, normalised and ranked
//! - `fallback`: primary strategy → external catalog fallback chain
//! - `coordinator`: single-flight related-species resolution per subject

pub mod coordinator;
pub mod fallback;
pub mod strategy;

use serde::Serialize;

use biodex_common::{BiodexError, SpeciesRecord, TaxonId};

pub use coordinator::{Coordinator, CoordinatorConfig, ResolveOutcome};
pub use fallback::{ChainOutcome, FallbackChain, FallbackStage};
pub use strategy::{StrategyClient, StrategyRequest};

/// What a strategy call reports to the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    /// 401 from upstream. The session hook has already run; never falls back.
    #[error("Session is not authenticated")]
    Unauthenticated,

    /// Network failure, timeout, non-2xx or unreadable payload.
    #[error("Strategy unavailable: {0}")]
    Unavailable(String),
}

impl From<BiodexError> for StrategyError {
    fn from(e: BiodexError) -> Self {
        if e.is_unauthenticated() {
            StrategyError::Unauthenticated
        } else {
            StrategyError::Unavailable(e.to_string())
        }
    }
}

/// Display state of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Loading,
    /// Loaded with at least one record.
    Ok,
    /// Loaded, zero records.
    Empty,
    /// Could not load.
    Error,
}

/// Result of resolving related species for one subject.
///
/// Carries the originating `subject_id` so callers can drop stale results
/// when the displayed subject has changed in the meantime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub subject_id: TaxonId,
    pub records: Vec<SpeciesRecord>,
    pub status: ResolutionStatus,
}

impl Resolution {
    pub fn loading(subject_id: TaxonId) -> Self {
        Self { subject_id, records: Vec::new(), status: ResolutionStatus::Loading }
    }
}
