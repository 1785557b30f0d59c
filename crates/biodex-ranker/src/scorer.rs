//! Confidence ranking.
//!
//! Pipeline: dedup by taxon id (subject excluded) → fill missing scores →
//! stable sort by confidence descending → truncate to limit.

use tracing::debug;

use biodex_common::confidence::fallback_confidence;
use biodex_common::{SpeciesRecord, StrategyKind, TaxonId};
use biodex_ingestion::dedup::dedup_records;

use crate::weights::DecayProfile;

/// Whether every record carries a server-declared score.
pub fn is_server_scored(records: &[SpeciesRecord]) -> bool {
    !records.is_empty() && records.iter().all(|r| r.confidence.is_some())
}

/// Rank records produced by `kind`.
///
/// Records without a server score get the synthetic value for their
/// position (after dedup), so a wholly unscored list keeps upstream order
/// with strictly decreasing confidence. Ties keep their original order.
pub fn rank(
    records: Vec<SpeciesRecord>,
    kind: StrategyKind,
    subject: Option<TaxonId>,
    limit: usize,
) -> Vec<SpeciesRecord> {
    let mut records = dedup_records(records, subject);
    let server_scored = is_server_scored(&records);

    if !server_scored {
        let profile = DecayProfile::for_strategy(kind);
        for (index, record) in records.iter_mut().enumerate() {
            if record.confidence.is_none() {
                record.confidence = Some(match profile {
                    Some(profile) => profile.score_at(index),
                    None => fallback_confidence(record.taxon_id),
                });
            }
        }
    }

    // Vec::sort_by is stable.
    records.sort_by(|a, b| b.score().total_cmp(&a.score()));
    records.truncate(limit);

    debug!(strategy = %kind, server_scored, count = records.len(), "Ranked records");
    records
}
