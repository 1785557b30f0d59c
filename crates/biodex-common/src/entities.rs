//! Canonical entities flowing through the recommendation pipeline.

use serde::{Deserialize, Serialize};

/// Stable external identifier of a taxon. Unique key for dedup and single-flight.
pub type TaxonId = u64;

/// Canonical species record produced by the normaliser.
///
/// Built fresh per request/response cycle and never mutated once it has
/// left the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub taxon_id: TaxonId,
    pub common_name: String,
    pub scientific_name: String,
    /// Display image, resolved url > medium > square.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_square_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_medium_url: Option<String>,
    /// Taxonomic group label (iconic taxon), scopes fallback queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// In [0, 1]. `None` until a server score is read or the ranker synthesises one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Human-readable provenance. Informational only, never used for ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SpeciesRecord {
    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }

    /// Confidence used for ordering; unscored records sort last.
    pub fn score(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.group
            .as_deref()
            .map(|g| g.eq_ignore_ascii_case(group))
            .unwrap_or(false)
    }
}

/// A scientific-name candidate found in free text. Lives only for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionCandidate {
    pub name: String,
    /// 10 = parenthetical pairing, 8 = markdown emphasis, 5 = keyword-gated.
    pub priority: u8,
    /// Short snippet for diagnostics; not part of any output.
    pub context: String,
}

/// Recommendation strategies, plus the external catalog used as fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Personalized,
    ContentBased,
    Collaborative,
    Hybrid,
    ExternalFallback,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Personalized     => "personalized",
            StrategyKind::ContentBased     => "content_based",
            StrategyKind::Collaborative    => "collaborative",
            StrategyKind::Hybrid           => "hybrid",
            StrategyKind::ExternalFallback => "external_fallback",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
