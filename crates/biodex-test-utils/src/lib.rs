//! Test fixtures shared by the Biodex crates: a session that records its
//! hook invocations, and builders for upstream JSON payloads.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use reqwest::RequestBuilder;
use serde_json::{json, Value};

use biodex_common::{SessionHandler, TaxonId};

/// Session stub that counts 401 notifications instead of acting on them.
#[derive(Debug, Default)]
pub struct RecordingSession {
    authenticated: AtomicBool,
    expired_calls: AtomicUsize,
}

impl RecordingSession {
    pub fn authenticated() -> Self {
        Self { authenticated: AtomicBool::new(true), expired_calls: AtomicUsize::new(0) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn expired_calls(&self) -> usize {
        self.expired_calls.load(Ordering::SeqCst)
    }
}

impl SessionHandler for RecordingSession {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.is_authenticated() {
            request.bearer_auth("test-token")
        } else {
            request
        }
    }

    fn on_unauthenticated(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
        self.expired_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Backend recommendation item, without a server score.
pub fn backend_item(id: TaxonId, common: &str, sci: &str, group: &str) -> Value {
    json!({
        "taxon_id": id,
        "common_name": common,
        "sci_name": sci,
        "group": group,
        "image_square_url": format!("https://static.example.org/{id}/square.jpg"),
        "image_medium_url": format!("https://static.example.org/{id}/medium.jpg"),
    })
}

/// Backend recommendation item carrying `recommendation_score`.
pub fn scored_item(id: TaxonId, common: &str, score: f64) -> Value {
    let mut item = backend_item(id, common, "Genus species", "Aves");
    item["recommendation_score"] = json!(score);
    item
}

/// Species search hit as returned by `species/search`.
pub fn search_hit(id: TaxonId, sci: &str, common: &str) -> Value {
    json!({
        "taxon_id": id,
        "scientific_name": sci,
        "common_name": common,
        "image_url": format!("https://static.example.org/{id}.jpg"),
    })
}

/// Public catalog taxon with a photo.
pub fn catalog_taxon(id: TaxonId, sci: &str, common: Option<&str>, iconic: &str) -> Value {
    let mut taxon = json!({
        "id": id,
        "name": sci,
        "rank": "species",
        "iconic_taxon_name": iconic,
        "default_photo": {
            "square_url": format!("https://static.example.org/photos/{id}/square.jpg"),
            "medium_url": format!("https://static.example.org/photos/{id}/medium.jpg"),
        },
    });
    if let Some(name) = common {
        taxon["preferred_common_name"] = json!(name);
    }
    taxon
}

/// Wrap items in the `{ "results": [...] }` envelope.
pub fn envelope(items: Vec<Value>) -> String {
    json!({ "results": items }).to_string()
}
