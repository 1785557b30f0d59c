//! Upstream item → canonical `SpeciesRecord`.
//!
//! Each endpoint names its fields differently (backend recommendations use
//! `sci_name`, search results use `scientific_name`, the public catalog uses
//! `id`/`name`/`default_photo`). Resolution order is first-present-wins.
//! Items without a usable taxon id are dropped silently: partial records are
//! routine in upstream payloads.

use serde_json::Value;
use tracing::debug;

use biodex_common::confidence::clamp_score;
use biodex_common::{SpeciesRecord, TaxonId};

use super::groups::canonical_group;

const UNKNOWN_COMMON_NAME: &str = "Unknown";

/// Normalise one upstream item. `None` when no taxon id can be resolved.
pub fn normalise_item(item: &Value) -> Option<SpeciesRecord> {
    let taxon_id = taxon_id(item)?;

    let image_medium_url = first_str(item, &["image_medium_url"])
        .or_else(|| nested_str(item, "default_photo", "medium_url"));
    let image_square_url = first_str(item, &["image_square_url"])
        .or_else(|| nested_str(item, "default_photo", "square_url"));
    let image_url = first_str(item, &["image_url"])
        .or_else(|| image_medium_url.clone())
        .or_else(|| image_square_url.clone());

    let common_name = first_str(item, &["common_name", "preferred_common_name"])
        .unwrap_or_else(|| UNKNOWN_COMMON_NAME.to_string());
    let scientific_name = first_str(item, &["sci_name", "scientific_name", "name"])
        .unwrap_or_default();

    let group = first_str(item, &["group", "iconic_taxon_name"]).map(|g| canonical_group(&g));

    let confidence = ["confidence", "recommendation_score", "score"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_f64))
        .and_then(clamp_score);

    let reason = first_str(item, &["reason", "recommendation_reason"]);

    Some(SpeciesRecord {
        taxon_id,
        common_name,
        scientific_name,
        image_url,
        image_square_url,
        image_medium_url,
        group,
        confidence,
        reason,
    })
}

/// Normalise a batch, dropping items without a usable id.
pub fn normalise_items(items: &[Value]) -> Vec<SpeciesRecord> {
    let records: Vec<SpeciesRecord> = items.iter().filter_map(normalise_item).collect();
    if records.len() < items.len() {
        debug!(
            dropped = items.len() - records.len(),
            kept = records.len(),
            "Dropped upstream items without taxon id"
        );
    }
    records
}

/// Whether the raw item carries a real display name (not the "Unknown" filler).
pub fn has_display_name(item: &Value) -> bool {
    first_str(item, &["common_name", "preferred_common_name"]).is_some()
}

/// `taxon_id` | `id`, as a positive integer or a numeric string.
fn taxon_id(item: &Value) -> Option<TaxonId> {
    ["taxon_id", "id"].iter().find_map(|key| {
        let raw = item.get(*key)?;
        let id = match raw {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }?;
        (id > 0).then_some(id)
    })
}

fn first_str(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        item.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

fn nested_str(item: &Value, outer: &str, inner: &str) -> Option<String> {
    item.get(outer)
        .and_then(|o| o.get(inner))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
