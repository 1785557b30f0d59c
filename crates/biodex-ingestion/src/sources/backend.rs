//! Backend REST API client.
//!
//! Endpoints used (relative to `BackendConfig::base_url`):
//!   GET  recommendations/personalized?limit=N
//!   GET  recommendations/content-based/{id}?limit=N
//!   GET  recommendations/collaborative?limit=N
//!   POST recommendations/hybrid            {limit, algorithm}
//!   GET  species/search?q=<name>&limit=N
//!   POST user/history                      {taxon_id, action}
//!   POST recommendations/rating-feedback   {recommendation_id, species_id, rating, feedback_text}
//!   GET  user/insights
//!
//! Every response passes through the session: a 401 invokes the session
//! hook and surfaces as `BiodexError::Unauthenticated`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use biodex_common::sandbox::SandboxClient;
use biodex_common::{BiodexError, Result, SessionHandler, TaxonId};

use super::SpeciesLookup;
use crate::models::{
    InteractionKind, InteractionRecord, RecommendationFeedback, UpstreamPage, UserInsights,
};

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// Bound for single-item calls (search, interactions, feedback).
    pub single_timeout: Duration,
    /// Bound for list endpoints.
    pub batch_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            single_timeout: Duration::from_secs(10),
            batch_timeout: Duration::from_secs(45),
        }
    }
}

pub struct BackendClient {
    client: SandboxClient,
    config: BackendConfig,
    session: Arc<dyn SessionHandler>,
}

impl BackendClient {
    pub fn new(config: BackendConfig, session: Arc<dyn SessionHandler>) -> Result<Self> {
        let mut client = SandboxClient::new()?;
        client.allow_base_url(&config.base_url)?;
        Ok(Self { client, config, session })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send with credentials and map status codes onto the error taxonomy.
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = self.session.authorize(request).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.session.on_unauthenticated();
            return Err(BiodexError::Unauthenticated);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BiodexError::UpstreamStatus { status: status.as_u16(), body });
        }

        Ok(response)
    }

    async fn read_page(&self, request: RequestBuilder) -> Result<UpstreamPage> {
        let text = self.send(request).await?.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        UpstreamPage::from_value(body)
    }

    #[instrument(skip(self))]
    pub async fn personalized(&self, limit: usize) -> Result<UpstreamPage> {
        let request = self.client
            .get(&self.endpoint("recommendations/personalized"))?
            .query(&[("limit", limit.to_string())])
            .timeout(self.config.batch_timeout);
        let page = self.read_page(request).await?;
        debug!(count = page.results.len(), "Personalized recommendations received");
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn content_based(&self, subject: TaxonId, limit: usize) -> Result<UpstreamPage> {
        let path = format!("recommendations/content-based/{}", subject);
        let request = self.client
            .get(&self.endpoint(&path))?
            .query(&[("limit", limit.to_string())])
            .timeout(self.config.batch_timeout);
        let page = self.read_page(request).await?;
        debug!(count = page.results.len(), strategy = ?page.strategy, "Content-based recommendations received");
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn collaborative(&self, limit: usize) -> Result<UpstreamPage> {
        let request = self.client
            .get(&self.endpoint("recommendations/collaborative"))?
            .query(&[("limit", limit.to_string())])
            .timeout(self.config.batch_timeout);
        let page = self.read_page(request).await?;
        debug!(count = page.results.len(), "Collaborative recommendations received");
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn hybrid(&self, limit: usize) -> Result<UpstreamPage> {
        let request = self.client
            .post(&self.endpoint("recommendations/hybrid"))?
            .json(&json!({ "limit": limit, "algorithm": "hybrid" }))
            .timeout(self.config.batch_timeout);
        let page = self.read_page(request).await?;
        debug!(count = page.results.len(), explanation = ?page.explanation, "Hybrid recommendations received");
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn record_interaction(&self, taxon_id: TaxonId, kind: InteractionKind) -> Result<()> {
        let request = self.client
            .post(&self.endpoint("user/history"))?
            .json(&InteractionRecord { taxon_id, action: kind })
            .timeout(self.config.single_timeout);
        self.send(request).await?;
        debug!(action = kind.as_str(), "Interaction recorded");
        Ok(())
    }

    #[instrument(skip(self, feedback), fields(species_id = feedback.species_id, rating = feedback.rating))]
    pub async fn submit_feedback(&self, feedback: &RecommendationFeedback) -> Result<()> {
        feedback.validate()?;
        let request = self.client
            .post(&self.endpoint("recommendations/rating-feedback"))?
            .json(feedback)
            .timeout(self.config.single_timeout);
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn user_insights(&self) -> Result<UserInsights> {
        let request = self.client
            .get(&self.endpoint("user/insights"))?
            .timeout(self.config.single_timeout);
        let text = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SpeciesLookup for BackendClient {
    #[instrument(skip(self))]
    async fn search_species(&self, name: &str, limit: usize) -> Result<Vec<Value>> {
        let request = self.client
            .get(&self.endpoint("species/search"))?
            .query(&[("q", name.to_string()), ("limit", limit.to_string())])
            .timeout(self.config.single_timeout);
        Ok(self.read_page(request).await?.results)
    }
}
