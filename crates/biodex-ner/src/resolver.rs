//! Per-candidate resolution of mentions against a species catalog.
//!
//! Lookups run concurrently; a failed lookup only drops its own candidate.

use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use biodex_common::{MentionCandidate, SpeciesRecord};
use biodex_ingestion::dedup::dedup_records;
use biodex_ingestion::normalise::normalise_item;
use biodex_ingestion::sources::SpeciesLookup;

use crate::extractor::MentionExtractor;

pub struct MentionResolver {
    lookup: Arc<dyn SpeciesLookup>,
    search_limit: usize,
}

impl MentionResolver {
    pub fn new(lookup: Arc<dyn SpeciesLookup>, search_limit: usize) -> Self {
        Self { lookup, search_limit: search_limit.max(1) }
    }

    /// Resolve candidates to species, in candidate order, unique by taxon id.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn resolve(&self, candidates: &[MentionCandidate]) -> Vec<SpeciesRecord> {
        let resolved = join_all(candidates.iter().map(|c| self.resolve_one(c))).await;
        let records = dedup_records(resolved.into_iter().flatten().collect(), None);
        debug!(resolved = records.len(), "Mentions resolved");
        records
    }

    /// Extract candidates from `text` and resolve them.
    pub async fn resolve_text(&self, extractor: &MentionExtractor, text: &str) -> Vec<SpeciesRecord> {
        let candidates = extractor.extract(text);
        if candidates.is_empty() {
            return Vec::new();
        }
        self.resolve(&candidates).await
    }

    async fn resolve_one(&self, candidate: &MentionCandidate) -> Option<SpeciesRecord> {
        match self.lookup.search_species(&candidate.name, self.search_limit).await {
            Ok(results) => {
                let record = pick_match(&candidate.name, &results);
                if record.is_none() {
                    debug!(name = %candidate.name, "No catalog match");
                }
                record
            }
            Err(e) => {
                warn!(name = %candidate.name, error = %e, "Mention lookup failed; skipping");
                None
            }
        }
    }
}

/// Exact case-insensitive scientific-name match, else the first result.
fn pick_match(name: &str, results: &[Value]) -> Option<SpeciesRecord> {
    let exact = results.iter().find(|item| {
        ["sci_name", "scientific_name"].iter().any(|key| {
            item.get(*key)
                .and_then(Value::as_str)
                .is_some_and(|s| s.trim().eq_ignore_ascii_case(name))
        })
    });
    exact.or_else(|| results.first()).and_then(normalise_item)
}
