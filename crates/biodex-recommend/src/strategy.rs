//! Recommendation strategies.
//!
//! Every strategy calls its own backend endpoint, then runs the payload
//! through the normaliser and the ranker. Transport and payload problems
//! come back as `StrategyError::Unavailable`; a 401 comes back as
//! `StrategyError::Unauthenticated` after the session hook has run.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use biodex_common::{SpeciesRecord, StrategyKind, TaxonId};
use biodex_ingestion::models::UpstreamPage;
use biodex_ingestion::normalise::normalise_items;
use biodex_ingestion::sources::BackendClient;
use biodex_ranker::rank;

use crate::StrategyError;

type StrategyResult = std::result::Result<Vec<SpeciesRecord>, StrategyError>;

/// One strategy invocation, as handed to the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyRequest {
    Personalized { limit: usize },
    ContentBased { subject: TaxonId, limit: usize, group: Option<String> },
    Collaborative { limit: usize },
    Hybrid { limit: usize },
}

impl StrategyRequest {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyRequest::Personalized { .. }  => StrategyKind::Personalized,
            StrategyRequest::ContentBased { .. }  => StrategyKind::ContentBased,
            StrategyRequest::Collaborative { .. } => StrategyKind::Collaborative,
            StrategyRequest::Hybrid { .. }        => StrategyKind::Hybrid,
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            StrategyRequest::Personalized { limit }
            | StrategyRequest::ContentBased { limit, .. }
            | StrategyRequest::Collaborative { limit }
            | StrategyRequest::Hybrid { limit } => *limit,
        }
    }

    pub fn subject(&self) -> Option<TaxonId> {
        match self {
            StrategyRequest::ContentBased { subject, .. } => Some(*subject),
            _ => None,
        }
    }
}

pub struct StrategyClient {
    backend: Arc<BackendClient>,
}

impl StrategyClient {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<BackendClient> {
        &self.backend
    }

    pub async fn fetch(&self, request: &StrategyRequest) -> StrategyResult {
        match request {
            StrategyRequest::Personalized { limit } => self.personalized(*limit).await,
            StrategyRequest::ContentBased { subject, limit, group } => {
                self.content_based(*subject, *limit, group.as_deref()).await
            }
            StrategyRequest::Collaborative { limit } => self.collaborative(*limit).await,
            StrategyRequest::Hybrid { limit } => self.hybrid(*limit).await,
        }
    }

    /// Empty without any request when the session holds no token.
    #[instrument(skip(self))]
    pub async fn personalized(&self, limit: usize) -> StrategyResult {
        if !self.backend.is_authenticated() {
            debug!("No session; personalized recommendations skipped");
            return Ok(Vec::new());
        }
        let page = self.backend.personalized(limit).await?;
        let records = finish(page, StrategyKind::Personalized, None, limit, |record, _| {
            let topic = record.group.clone().unwrap_or_else(|| record.common_name.clone());
            format!("based on your history of {}", topic)
        });
        Ok(records)
    }

    /// Related species for `subject`. The subject never appears in the result.
    #[instrument(skip(self))]
    pub async fn content_based(
        &self,
        subject: TaxonId,
        limit: usize,
        group_hint: Option<&str>,
    ) -> StrategyResult {
        let page = self.backend.content_based(subject, limit).await?;
        let records = finish(page, StrategyKind::ContentBased, Some(subject), limit, |record, page| {
            let basis = page
                .strategy
                .clone()
                .or_else(|| record.group.clone())
                .or_else(|| group_hint.map(String::from))
                .unwrap_or_else(|| "taxonomic".to_string());
            format!("based on {} similarity", basis)
        });
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn collaborative(&self, limit: usize) -> StrategyResult {
        let page = self.backend.collaborative(limit).await?;
        Ok(finish(page, StrategyKind::Collaborative, None, limit, |_, _| {
            "recommended by users with similar tastes".to_string()
        }))
    }

    /// Combined ranking. Degrades to collaborative once when unavailable.
    #[instrument(skip(self))]
    pub async fn hybrid(&self, limit: usize) -> StrategyResult {
        match self.backend.hybrid(limit).await.map_err(StrategyError::from) {
            Ok(page) => Ok(finish(page, StrategyKind::Hybrid, None, limit, |_, page| {
                page.explanation
                    .clone()
                    .unwrap_or_else(|| "hybrid recommendation combining multiple algorithms".to_string())
            })),
            Err(StrategyError::Unavailable(reason)) => {
                warn!(%reason, "Hybrid unavailable; degrading to collaborative");
                self.collaborative(limit).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Normalise, attach provenance where upstream gave none, rank.
fn finish<F>(
    page: UpstreamPage,
    kind: StrategyKind,
    subject: Option<TaxonId>,
    limit: usize,
    reason: F,
) -> Vec<SpeciesRecord>
where
    F: Fn(&SpeciesRecord, &UpstreamPage) -> String,
{
    let mut records = normalise_items(&page.results);
    for record in &mut records {
        if record.reason.is_none() {
            record.reason = Some(reason(record, &page));
        }
    }
    let ranked = rank(records, kind, subject, limit);
    debug!(strategy = %kind, received = page.results.len(), returned = ranked.len(), "Strategy finished");
    ranked
}
