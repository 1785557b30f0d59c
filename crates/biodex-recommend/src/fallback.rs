//! Primary strategy → external catalog fallback.
//!
//! ```text
//! TryPrimary ──ok, non-empty──────────────────────────▶ Done(ok)
//!     │ unavailable | empty
//!     ▼
//! TryExternalFallback ──no group hint──────────────────▶ Done(empty | error)
//!     │ ok non-empty ▶ Done(ok), ok empty ▶ Done(empty), failure ▶ Done(error)
//! ```
//!
//! A 401 from the primary ends the chain at once. Each stage runs at most
//! once per request, strictly in order.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use biodex_common::{SpeciesRecord, StrategyKind};
use biodex_ingestion::normalise::canonical_group;
use biodex_ingestion::sources::CatalogClient;
use biodex_ranker::rank;

use crate::strategy::{StrategyClient, StrategyRequest};
use crate::{ResolutionStatus, StrategyError};

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackStage {
    TryPrimary,
    TryExternalFallback { primary_failed: bool },
    Done(ChainOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub records: Vec<SpeciesRecord>,
    /// Which tier produced the records; `None` when nothing was delivered.
    pub source: Option<StrategyKind>,
    pub status: ResolutionStatus,
}

impl ChainOutcome {
    fn delivered(records: Vec<SpeciesRecord>, source: StrategyKind) -> Self {
        Self { records, source: Some(source), status: ResolutionStatus::Ok }
    }

    fn empty() -> Self {
        Self { records: Vec::new(), source: None, status: ResolutionStatus::Empty }
    }

    fn failed() -> Self {
        Self { records: Vec::new(), source: None, status: ResolutionStatus::Error }
    }
}

pub struct FallbackChain {
    strategies: Arc<StrategyClient>,
    catalog: Arc<CatalogClient>,
}

impl FallbackChain {
    pub fn new(strategies: Arc<StrategyClient>, catalog: Arc<CatalogClient>) -> Self {
        Self { strategies, catalog }
    }

    pub fn strategies(&self) -> &Arc<StrategyClient> {
        &self.strategies
    }

    /// Run `request`, falling back to popular species of `group_hint`.
    #[instrument(skip(self), fields(strategy = %request.kind()))]
    pub async fn execute(&self, request: &StrategyRequest, group_hint: Option<&str>) -> ChainOutcome {
        let mut stage = FallbackStage::TryPrimary;
        loop {
            stage = match stage {
                FallbackStage::TryPrimary => self.try_primary(request).await,
                FallbackStage::TryExternalFallback { primary_failed } => {
                    self.try_external(request, group_hint, primary_failed).await
                }
                FallbackStage::Done(outcome) => {
                    info!(
                        status = ?outcome.status,
                        source = ?outcome.source,
                        count = outcome.records.len(),
                        "Fallback chain finished"
                    );
                    return outcome;
                }
            };
        }
    }

    async fn try_primary(&self, request: &StrategyRequest) -> FallbackStage {
        match self.strategies.fetch(request).await {
            Ok(records) if !records.is_empty() => {
                FallbackStage::Done(ChainOutcome::delivered(records, request.kind()))
            }
            Ok(_) => {
                debug!("Primary returned no usable records");
                FallbackStage::TryExternalFallback { primary_failed: false }
            }
            Err(StrategyError::Unauthenticated) => {
                warn!("Primary rejected the session; no fallback");
                FallbackStage::Done(ChainOutcome::failed())
            }
            Err(StrategyError::Unavailable(reason)) => {
                warn!(%reason, "Primary unavailable; trying external fallback");
                FallbackStage::TryExternalFallback { primary_failed: true }
            }
        }
    }

    async fn try_external(
        &self,
        request: &StrategyRequest,
        group_hint: Option<&str>,
        primary_failed: bool,
    ) -> FallbackStage {
        let Some(group) = group_hint.map(str::trim).filter(|g| !g.is_empty()) else {
            debug!("No group hint; external fallback skipped");
            return FallbackStage::Done(if primary_failed {
                ChainOutcome::failed()
            } else {
                ChainOutcome::empty()
            });
        };

        let subject = request.subject();
        let limit = request.limit();
        match self.catalog.popular_in_group(group, subject, limit).await {
            Ok(mut records) => {
                let label = canonical_group(group);
                for record in &mut records {
                    record.reason = Some(format!("popular in {}", label));
                }
                let ranked = rank(records, StrategyKind::ExternalFallback, subject, limit);
                if ranked.is_empty() {
                    FallbackStage::Done(ChainOutcome::empty())
                } else {
                    FallbackStage::Done(ChainOutcome::delivered(ranked, StrategyKind::ExternalFallback))
                }
            }
            Err(e) => {
                warn!(error = %e, "External fallback failed");
                FallbackStage::Done(ChainOutcome::failed())
            }
        }
    }
}
