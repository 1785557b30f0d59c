//! Single-flight related-species resolution.
//!
//! At most one resolution per subject is in flight. A `resolve` for the
//! subject that was dispatched last is a no-op until the caller `forget`s
//! it or asks for an explicit `retry`. Every state change is also
//! broadcast as a [`Resolution`] so several observers can follow along.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use biodex_common::TaxonId;
use biodex_ingestion::models::InteractionKind;

use crate::fallback::FallbackChain;
use crate::strategy::StrategyRequest;
use crate::{Resolution, ResolutionStatus};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub related_limit: usize,
    /// Lower bound on the visible duration of one resolution. Zero disables it.
    pub min_display_latency: Duration,
    /// Record a `view` interaction for the subject (authenticated sessions only).
    pub record_views: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            related_limit: 5,
            min_display_latency: Duration::ZERO,
            record_views: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    /// Same subject already in flight or last dispatched; nothing was sent.
    Dropped,
    Delivered(Resolution),
}

impl ResolveOutcome {
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            ResolveOutcome::Dropped => None,
            ResolveOutcome::Delivered(resolution) => Some(resolution),
        }
    }
}

pub struct Coordinator {
    chain: Arc<FallbackChain>,
    config: CoordinatorConfig,
    /// subject → dispatch time
    in_flight: Mutex<HashMap<TaxonId, Instant>>,
    last_dispatched: Mutex<Option<TaxonId>>,
    events: broadcast::Sender<Resolution>,
}

/// Releases the in-flight entry even if the resolving future is dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<TaxonId, Instant>>,
    subject: TaxonId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(started) = map.remove(&self.subject) {
            debug!(
                taxon_id = self.subject,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "In-flight marker released"
            );
        }
    }
}

impl Coordinator {
    pub fn new(chain: Arc<FallbackChain>, config: CoordinatorConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            chain,
            config,
            in_flight: Mutex::new(HashMap::new()),
            last_dispatched: Mutex::new(None),
            events,
        }
    }

    /// Follow every `Loading` and final resolution.
    pub fn subscribe(&self) -> broadcast::Receiver<Resolution> {
        self.events.subscribe()
    }

    pub fn is_in_flight(&self, subject: TaxonId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&subject)
    }

    pub fn last_dispatched(&self) -> Option<TaxonId> {
        *self.last_dispatched.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The caller left the subject; the next `resolve` dispatches again.
    pub fn forget(&self) {
        *self.last_dispatched.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Related species for `subject`, unless this subject is in flight or
    /// was the last one dispatched.
    pub async fn resolve(&self, subject: TaxonId, group_hint: Option<&str>) -> ResolveOutcome {
        if !self.try_dispatch(subject, false) {
            debug!(taxon_id = subject, "Duplicate resolve dropped");
            return ResolveOutcome::Dropped;
        }
        self.run(subject, group_hint).await
    }

    /// Intentional new attempt: ignores the last-dispatched marker but still
    /// never overlaps an in-flight resolution of the same subject.
    pub async fn retry(&self, subject: TaxonId, group_hint: Option<&str>) -> ResolveOutcome {
        if !self.try_dispatch(subject, true) {
            debug!(taxon_id = subject, "Retry dropped; resolution still in flight");
            return ResolveOutcome::Dropped;
        }
        self.run(subject, group_hint).await
    }

    /// Register `subject` as in flight and last dispatched. Both markers are
    /// checked and set under their locks, before any await point.
    fn try_dispatch(&self, subject: TaxonId, force: bool) -> bool {
        let mut last = self.last_dispatched.lock().unwrap_or_else(|e| e.into_inner());
        if !force && *last == Some(subject) {
            return false;
        }
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if in_flight.contains_key(&subject) {
            return false;
        }
        in_flight.insert(subject, Instant::now());
        *last = Some(subject);
        true
    }

    #[instrument(skip(self), fields(taxon_id = subject))]
    async fn run(&self, subject: TaxonId, group_hint: Option<&str>) -> ResolveOutcome {
        let _guard = InFlightGuard { in_flight: &self.in_flight, subject };

        // No receivers is fine.
        let _ = self.events.send(Resolution::loading(subject));

        let work = self.resolve_related(subject, group_hint);
        let resolution = if self.config.min_display_latency.is_zero() {
            work.await
        } else {
            let (resolution, _) = tokio::join!(work, tokio::time::sleep(self.config.min_display_latency));
            resolution
        };

        info!(
            status = ?resolution.status,
            count = resolution.records.len(),
            "Related species resolved"
        );
        let _ = self.events.send(resolution.clone());
        ResolveOutcome::Delivered(resolution)
    }

    async fn resolve_related(&self, subject: TaxonId, group_hint: Option<&str>) -> Resolution {
        let backend = self.chain.strategies().backend();
        if self.config.record_views && backend.is_authenticated() {
            match backend.record_interaction(subject, InteractionKind::View).await {
                Ok(()) => {}
                Err(e) if e.is_unauthenticated() => {
                    warn!("Session rejected while recording view; resolution ends");
                    return Resolution { subject_id: subject, records: Vec::new(), status: ResolutionStatus::Error };
                }
                Err(e) => warn!(error = %e, "Failed to record view"),
            }
        }

        let request = StrategyRequest::ContentBased {
            subject,
            limit: self.config.related_limit,
            group: group_hint.map(String::from),
        };
        let outcome = self.chain.execute(&request, group_hint).await;

        let status = match outcome.status {
            ResolutionStatus::Ok if outcome.records.is_empty() => ResolutionStatus::Empty,
            status => status,
        };
        Resolution { subject_id: subject, records: outcome.records, status }
    }
}
