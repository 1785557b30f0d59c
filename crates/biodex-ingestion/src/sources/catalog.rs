//! Public species catalog client (iNaturalist-compatible `/taxa` API).
//!
//! Used only as the popularity fallback: popular species of one iconic
//! group, ordered by observation count. Anonymous, no session involved.
//!
//! Requests oversample by `oversample × limit` because a large share of
//! catalog entries lack a vernacular name or a photo and get filtered out.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use biodex_common::sandbox::SandboxClient;
use biodex_common::{BiodexError, Result, SpeciesRecord, TaxonId};

use crate::models::UpstreamPage;
use crate::normalise::{canonical_group, has_display_name, iconic_taxon, normalise_item};

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub locale: String,
    pub oversample: usize,
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.inaturalist.org/v1".to_string(),
            locale: "pt".to_string(),
            oversample: 3,
            timeout: Duration::from_secs(45),
        }
    }
}

pub struct CatalogClient {
    client: SandboxClient,
    config: CatalogConfig,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let mut client = SandboxClient::new()?;
        client.allow_base_url(&config.base_url)?;
        Ok(Self { client, config })
    }

    /// Popular species in `group`, excluding `subject`, at most `limit`.
    ///
    /// Entries must carry a display name and an image and belong to the
    /// requested group. Order is the catalog's popularity order.
    #[instrument(skip(self))]
    pub async fn popular_in_group(
        &self,
        group: &str,
        subject: Option<TaxonId>,
        limit: usize,
    ) -> Result<Vec<SpeciesRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let iconic = iconic_taxon(group)
            .map(String::from)
            .unwrap_or_else(|| canonical_group(group));
        let per_page = limit.saturating_mul(self.config.oversample.max(1));

        let url = format!("{}/taxa", self.config.base_url.trim_end_matches('/'));
        let response = self.client
            .get(&url)?
            .query(&[
                ("rank", "species".to_string()),
                ("iconic_taxa", iconic.clone()),
                ("order_by", "observations_count".to_string()),
                ("order", "desc".to_string()),
                ("per_page", per_page.to_string()),
                ("locale", self.config.locale.clone()),
            ])
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BiodexError::UpstreamStatus { status: status.as_u16(), body });
        }

        let body: Value = serde_json::from_str(&response.text().await?)?;
        let page = UpstreamPage::from_value(body)?;
        let fetched = page.results.len();

        let records: Vec<SpeciesRecord> = page
            .results
            .iter()
            .filter(|item| has_display_name(item))
            .filter_map(normalise_item)
            .filter(|r| r.has_image() && r.in_group(&iconic) && Some(r.taxon_id) != subject)
            .take(limit)
            .collect();

        debug!(fetched, kept = records.len(), group = %iconic, "Catalog popularity page filtered");
        Ok(records)
    }
}
