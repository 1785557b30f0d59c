//! `biodex` — command-line front end for the recommendation pipeline.

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use biodex_common::{StaticSession, TaxonId};
use biodex_ingestion::models::RecommendationFeedback;
use biodex_ingestion::sources::{BackendClient, CatalogClient};
use biodex_ner::{MentionExtractor, MentionResolver};
use biodex_recommend::{Coordinator, FallbackChain, ResolveOutcome, StrategyClient, StrategyRequest};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "biodex")]
#[command(about = "Species recommendations and mention resolution")]
#[command(version)]
struct Cli {
    /// Bearer token for the backend
    #[arg(long, env = "BIODEX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Species related to a subject (single-flight, with catalog fallback)
    Related {
        taxon_id: TaxonId,
        /// Taxonomic group of the subject, enables the catalog fallback
        #[arg(long)]
        group: Option<String>,
    },
    /// Run one recommendation strategy
    Recommend {
        #[arg(value_enum)]
        strategy: StrategyArg,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        group: Option<String>,
    },
    /// Extract and resolve scientific names mentioned in free text
    Mentions { text: String },
    /// Rate a recommendation (1-5)
    Feedback {
        recommendation_id: String,
        species_id: TaxonId,
        rating: u8,
        #[arg(long, default_value = "")]
        text: String,
    },
    /// Show the user's activity insights
    Insights,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Personalized,
    Collaborative,
    Hybrid,
}

impl StrategyArg {
    fn request(self, limit: usize) -> StrategyRequest {
        match self {
            StrategyArg::Personalized  => StrategyRequest::Personalized { limit },
            StrategyArg::Collaborative => StrategyRequest::Collaborative { limit },
            StrategyArg::Hybrid        => StrategyRequest::Hybrid { limit },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("biodex=info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    info!(backend = %config.backend.base_url, "Biodex starting");

    let session = Arc::new(StaticSession::new(cli.token, || {
        warn!("Backend rejected the session; set a fresh BIODEX_TOKEN");
    }));
    let backend = Arc::new(
        BackendClient::new(config.backend_config(), session).context("building backend client")?,
    );

    match cli.command {
        Command::Related { taxon_id, group } => {
            let coordinator = Coordinator::new(pipeline(&config, backend)?, config.coordinator_config());
            match coordinator.resolve(taxon_id, group.as_deref()).await {
                ResolveOutcome::Delivered(resolution) => print_json(&resolution)?,
                ResolveOutcome::Dropped => warn!(taxon_id, "Resolution dropped"),
            }
        }
        Command::Recommend { strategy, limit, group } => {
            let chain = pipeline(&config, backend)?;
            let outcome = chain.execute(&strategy.request(limit), group.as_deref()).await;
            print_json(&json!({
                "source": outcome.source,
                "status": outcome.status,
                "records": outcome.records,
            }))?;
        }
        Command::Mentions { text } => {
            let extractor = MentionExtractor::new(config.extractor_config())?;
            let candidates = extractor.extract(&text);
            for candidate in &candidates {
                info!(name = %candidate.name, priority = candidate.priority, context = %candidate.context, "Candidate");
            }
            let resolver = MentionResolver::new(backend, config.mentions.search_limit);
            print_json(&resolver.resolve(&candidates).await)?;
        }
        Command::Feedback { recommendation_id, species_id, rating, text } => {
            let feedback = RecommendationFeedback::new(recommendation_id, species_id, rating).with_text(text);
            backend.submit_feedback(&feedback).await?;
            info!("Feedback submitted");
        }
        Command::Insights => {
            print_json(&backend.user_insights().await?)?;
        }
    }

    Ok(())
}

fn pipeline(config: &Config, backend: Arc<BackendClient>) -> anyhow::Result<Arc<FallbackChain>> {
    let catalog = CatalogClient::new(config.catalog_config()).context("building catalog client")?;
    let strategies = StrategyClient::new(backend);
    Ok(Arc::new(FallbackChain::new(Arc::new(strategies), Arc::new(catalog))))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
