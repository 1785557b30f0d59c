//! Per-strategy decay profiles for synthetic confidence.

use serde::{Deserialize, Serialize};

use biodex_common::confidence::synthetic_confidence;
use biodex_common::StrategyKind;

/// Linear decay `base - index * step` used when upstream sends no score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayProfile {
    pub base: f64,
    pub step: f64,
}

impl DecayProfile {
    pub const PERSONALIZED:  DecayProfile = DecayProfile { base: 0.95, step: 0.05 };
    pub const CONTENT_BASED: DecayProfile = DecayProfile { base: 0.95, step: 0.05 };
    pub const COLLABORATIVE: DecayProfile = DecayProfile { base: 0.90, step: 0.05 };
    pub const HYBRID:        DecayProfile = DecayProfile { base: 0.95, step: 0.03 };

    /// Profile for a strategy. `None` for the external fallback, which uses
    /// per-taxon jitter instead of positional decay.
    pub fn for_strategy(kind: StrategyKind) -> Option<Self> {
        match kind {
            StrategyKind::Personalized     => Some(Self::PERSONALIZED),
            StrategyKind::ContentBased     => Some(Self::CONTENT_BASED),
            StrategyKind::Collaborative    => Some(Self::COLLABORATIVE),
            StrategyKind::Hybrid           => Some(Self::HYBRID),
            StrategyKind::ExternalFallback => None,
        }
    }

    pub fn score_at(&self, index: usize) -> f64 {
        synthetic_confidence(self.base, self.step, index)
    }

    /// Base in (0, 1] and a positive step.
    pub fn validate(&self) -> bool {
        self.base > 0.0 && self.base <= 1.0 && self.step > 0.0
    }
}
