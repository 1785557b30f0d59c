//! Wire models for the backend and catalog APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use biodex_common::{BiodexError, Result, TaxonId};

/// One page of upstream items plus the metadata the backend attaches.
///
/// Items stay untyped here; the normaliser decides what is usable.
#[derive(Debug, Clone, Default)]
pub struct UpstreamPage {
    pub results: Vec<Value>,
    /// Strategy label reported by the backend (content-based endpoint).
    pub strategy: Option<String>,
    /// Human-readable explanation (hybrid endpoint).
    pub explanation: Option<String>,
}

impl UpstreamPage {
    /// Accepts `{ "results": [...] , ... }` or a bare array.
    pub fn from_value(body: Value) -> Result<Self> {
        match body {
            Value::Array(results) => Ok(Self { results, ..Default::default() }),
            Value::Object(mut map) => {
                let results = match map.remove("results") {
                    Some(Value::Array(items)) => items,
                    Some(other) => {
                        return Err(BiodexError::MalformedPayload(format!(
                            "`results` is not an array: {}",
                            type_name(&other)
                        )))
                    }
                    None => {
                        return Err(BiodexError::MalformedPayload(
                            "response has no `results` field".to_string(),
                        ))
                    }
                };
                let text = |key: &str| map.get(key).and_then(Value::as_str).map(String::from);
                Ok(Self {
                    results,
                    strategy: text("strategy"),
                    explanation: text("explanation"),
                })
            }
            other => Err(BiodexError::MalformedPayload(format!(
                "expected object or array, got {}",
                type_name(&other)
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// User actions the backend records to personalise recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Click,
    Favorite,
    Share,
    Identify,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::View     => "view",
            InteractionKind::Click    => "click",
            InteractionKind::Favorite => "favorite",
            InteractionKind::Share    => "share",
            InteractionKind::Identify => "identify",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionRecord {
    pub taxon_id: TaxonId,
    pub action: InteractionKind,
}

/// Star rating on a recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationFeedback {
    pub recommendation_id: String,
    pub species_id: TaxonId,
    /// 1..=5
    pub rating: u8,
    pub feedback_text: String,
}

impl RecommendationFeedback {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    pub fn new(recommendation_id: impl Into<String>, species_id: TaxonId, rating: u8) -> Self {
        Self {
            recommendation_id: recommendation_id.into(),
            species_id,
            rating,
            feedback_text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.feedback_text = text.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating) {
            return Err(BiodexError::InvalidInput(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN_RATING,
                Self::MAX_RATING,
                self.rating
            )));
        }
        Ok(())
    }
}

/// Aggregated view of the user's activity, computed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInsights {
    pub total_interactions: u64,
    #[serde(default)]
    pub favorite_groups: Vec<FavoriteGroup>,
    #[serde(default)]
    pub recent_activity: Vec<RecentActivity>,
    #[serde(default)]
    pub preference_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteGroup {
    pub group_id: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub species_id: TaxonId,
    pub interaction_type: String,
    pub created_at: DateTime<Utc>,
}
