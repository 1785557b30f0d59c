//! Configuration loading for Biodex.
//! Reads biodex.toml from the current directory or the path in BIODEX_CONFIG.
//! A missing file means built-in defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use biodex_ingestion::sources::{BackendConfig, CatalogConfig};
use biodex_ner::ExtractorConfig;
use biodex_recommend::CoordinatorConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub timeouts: TimeoutSection,
    #[serde(default)]
    pub coordinator: CoordinatorSection,
    #[serde(default)]
    pub mentions: MentionsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
}

fn default_backend_url() -> String { "http://localhost:3000/api".to_string() }

impl Default for BackendSection {
    fn default() -> Self {
        Self { base_url: default_backend_url() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_oversample")]
    pub oversample: usize,
}

fn default_catalog_url() -> String { "https://api.inaturalist.org/v1".to_string() }
fn default_locale()      -> String { "pt".to_string() }
fn default_oversample()  -> usize  { 3 }

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            locale: default_locale(),
            oversample: default_oversample(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSection {
    #[serde(default = "default_single_secs")]
    pub single_secs: u64,
    #[serde(default = "default_batch_secs")]
    pub batch_secs: u64,
}

fn default_single_secs() -> u64 { 10 }
fn default_batch_secs()  -> u64 { 45 }

impl Default for TimeoutSection {
    fn default() -> Self {
        Self { single_secs: default_single_secs(), batch_secs: default_batch_secs() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorSection {
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
    #[serde(default)]
    pub min_display_latency_ms: u64,
    #[serde(default = "default_record_views")]
    pub record_views: bool,
}

fn default_related_limit() -> usize { 5 }
fn default_record_views()  -> bool  { true }

impl Default for CoordinatorSection {
    fn default() -> Self {
        Self {
            related_limit: default_related_limit(),
            min_display_latency_ms: 0,
            record_views: default_record_views(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionsSection {
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_max_candidates() -> usize { 3 }
fn default_search_limit()   -> usize { 3 }

impl Default for MentionsSection {
    fn default() -> Self {
        Self { max_candidates: default_max_candidates(), search_limit: default_search_limit() }
    }
}

impl Config {
    /// Load configuration from biodex.toml.
    /// Checks BIODEX_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("BIODEX_CONFIG").unwrap_or_else(|_| "biodex.toml".to_string());

        if !Path::new(&path).exists() {
            tracing::info!(path = %path, "No config file; using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config file {}", path))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.catalog.oversample == 0 {
            anyhow::bail!("catalog.oversample must be at least 1");
        }
        if self.mentions.max_candidates == 0 {
            anyhow::bail!("mentions.max_candidates must be at least 1");
        }
        if self.timeouts.single_secs == 0 || self.timeouts.batch_secs == 0 {
            anyhow::bail!("timeouts must be positive");
        }
        Ok(())
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.backend.base_url.clone(),
            single_timeout: Duration::from_secs(self.timeouts.single_secs),
            batch_timeout: Duration::from_secs(self.timeouts.batch_secs),
        }
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: self.catalog.base_url.clone(),
            locale: self.catalog.locale.clone(),
            oversample: self.catalog.oversample,
            timeout: Duration::from_secs(self.timeouts.batch_secs),
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            related_limit: self.coordinator.related_limit,
            min_display_latency: Duration::from_millis(self.coordinator.min_display_latency_ms),
            record_views: self.coordinator.record_views,
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig { max_candidates: self.mentions.max_candidates, ..Default::default() }
    }
}
