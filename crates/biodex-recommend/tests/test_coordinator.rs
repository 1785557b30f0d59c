//! Single-flight coordinator behaviour.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mockito::{Matcher, Mock, Server, ServerGuard};
use pretty_assertions::assert_eq;

use biodex_ingestion::sources::{BackendClient, BackendConfig, CatalogClient, CatalogConfig};
use biodex_recommend::{
    Coordinator, CoordinatorConfig, FallbackChain, ResolutionStatus, ResolveOutcome, StrategyClient,
};
use biodex_test_utils::{backend_item, envelope, RecordingSession};

fn coordinator(server: &ServerGuard, session: Arc<RecordingSession>, config: CoordinatorConfig) -> Coordinator {
    let backend_config = BackendConfig { base_url: format!("{}/api", server.url()), ..Default::default() };
    let backend = BackendClient::new(backend_config, session).unwrap();
    let catalog_config = CatalogConfig { base_url: format!("{}/v1", server.url()), ..Default::default() };
    let catalog = CatalogClient::new(catalog_config).unwrap();
    let chain = FallbackChain::new(Arc::new(StrategyClient::new(Arc::new(backend))), Arc::new(catalog));
    Coordinator::new(Arc::new(chain), config)
}

fn quiet() -> CoordinatorConfig {
    CoordinatorConfig { record_views: false, ..Default::default() }
}

async fn related_mock(server: &mut ServerGuard, subject: u64, expected: usize) -> Mock {
    server
        .mock("GET", format!("/api/recommendations/content-based/{subject}").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope(vec![
            backend_item(100 + subject, "Melro", "Turdus merula", "Aves"),
            backend_item(200 + subject, "Pardal", "Passer domesticus", "Aves"),
        ]))
        .expect(expected)
        .create_async()
        .await
}

#[tokio::test]
async fn test_concurrent_resolves_share_one_upstream_call() {
    let mut server = Server::new_async().await;
    let mock = related_mock(&mut server, 7, 1).await;
    let coordinator = coordinator(&server, Arc::new(RecordingSession::authenticated()), quiet());

    let (first, second) = tokio::join!(coordinator.resolve(7, Some("Aves")), coordinator.resolve(7, Some("Aves")));

    let delivered: Vec<&ResolveOutcome> = [&first, &second]
        .into_iter()
        .filter(|o| matches!(o, ResolveOutcome::Delivered(_)))
        .collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(second, ResolveOutcome::Dropped);

    let resolution = first.resolution().unwrap();
    assert_eq!(resolution.subject_id, 7);
    assert_eq!(resolution.status, ResolutionStatus::Ok);
    assert_eq!(resolution.records.len(), 2);
    assert!(!coordinator.is_in_flight(7));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_last_dispatched_is_noop_until_retry_or_forget() {
    let mut server = Server::new_async().await;
    let mock = related_mock(&mut server, 7, 3).await;
    let coordinator = coordinator(&server, Arc::new(RecordingSession::authenticated()), quiet());

    assert!(matches!(coordinator.resolve(7, None).await, ResolveOutcome::Delivered(_)));
    assert_eq!(coordinator.resolve(7, None).await, ResolveOutcome::Dropped);
    assert_eq!(coordinator.last_dispatched(), Some(7));

    assert!(matches!(coordinator.retry(7, None).await, ResolveOutcome::Delivered(_)));

    coordinator.forget();
    assert_eq!(coordinator.last_dispatched(), None);
    assert!(matches!(coordinator.resolve(7, None).await, ResolveOutcome::Delivered(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_new_subject_dispatches() {
    let mut server = Server::new_async().await;
    let seven = related_mock(&mut server, 7, 2).await;
    let eight = related_mock(&mut server, 8, 1).await;
    let coordinator = coordinator(&server, Arc::new(RecordingSession::authenticated()), quiet());

    coordinator.resolve(7, None).await;
    let outcome = coordinator.resolve(8, None).await;
    assert_eq!(outcome.resolution().map(|r| r.subject_id), Some(8));
    // 7 is no longer the last dispatched subject.
    assert!(matches!(coordinator.resolve(7, None).await, ResolveOutcome::Delivered(_)));

    seven.assert_async().await;
    eight.assert_async().await;
}

#[tokio::test]
async fn test_failure_without_group_reports_error_with_events() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/recommendations/content-based/9")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let coordinator = coordinator(&server, Arc::new(RecordingSession::authenticated()), quiet());
    let mut events = coordinator.subscribe();

    let outcome = coordinator.resolve(9, None).await;
    let resolution = outcome.resolution().unwrap();
    assert_eq!(resolution.status, ResolutionStatus::Error);
    assert!(resolution.records.is_empty());

    let loading = events.recv().await.unwrap();
    assert_eq!(loading.status, ResolutionStatus::Loading);
    assert_eq!(loading.subject_id, 9);
    let done = events.recv().await.unwrap();
    assert_eq!(done.status, ResolutionStatus::Error);
}

#[tokio::test]
async fn test_empty_is_distinct_from_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/recommendations/content-based/9")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope(vec![]))
        .create_async()
        .await;
    let coordinator = coordinator(&server, Arc::new(RecordingSession::authenticated()), quiet());

    let outcome = coordinator.resolve(9, None).await;
    assert_eq!(outcome.resolution().unwrap().status, ResolutionStatus::Empty);
}

#[tokio::test]
async fn test_min_display_latency_floor() {
    let mut server = Server::new_async().await;
    related_mock(&mut server, 7, 1).await;
    let config = CoordinatorConfig { min_display_latency: Duration::from_millis(150), ..quiet() };
    let coordinator = coordinator(&server, Arc::new(RecordingSession::authenticated()), config);

    let started = Instant::now();
    coordinator.resolve(7, None).await;
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_view_recorded_and_failure_ignored() {
    let mut server = Server::new_async().await;
    let history = server
        .mock("POST", "/api/user/history")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    related_mock(&mut server, 7, 1).await;
    let coordinator = coordinator(
        &server,
        Arc::new(RecordingSession::authenticated()),
        CoordinatorConfig::default(),
    );

    let outcome = coordinator.resolve(7, None).await;
    assert_eq!(outcome.resolution().unwrap().status, ResolutionStatus::Ok);
    history.assert_async().await;
}

#[tokio::test]
async fn test_anonymous_session_records_no_view() {
    let mut server = Server::new_async().await;
    let history = server
        .mock("POST", "/api/user/history")
        .expect(0)
        .create_async()
        .await;
    related_mock(&mut server, 7, 1).await;
    let session = Arc::new(RecordingSession::anonymous());
    let coordinator = coordinator(&server, session.clone(), CoordinatorConfig::default());

    coordinator.resolve(7, None).await;
    assert_eq!(session.expired_calls(), 0);
    history.assert_async().await;
}

#[tokio::test]
async fn test_rejected_view_ends_resolution_with_single_hook_call() {
    let mut server = Server::new_async().await;
    let history = server
        .mock("POST", "/api/user/history")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let related = related_mock(&mut server, 7, 0).await;
    let session = Arc::new(RecordingSession::authenticated());
    let coordinator = coordinator(&server, session.clone(), CoordinatorConfig::default());

    let outcome = coordinator.resolve(7, Some("Aves")).await;
    let resolution = outcome.resolution().unwrap();
    assert_eq!(resolution.status, ResolutionStatus::Error);
    assert!(resolution.records.is_empty());
    assert_eq!(session.expired_calls(), 1);
    assert!(!coordinator.is_in_flight(7));
    history.assert_async().await;
    related.assert_async().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_across_worker_threads() {
    let mut server = Server::new_async().await;
    let mock = related_mock(&mut server, 7, 1).await;
    let coordinator = Arc::new(coordinator(&server, Arc::new(RecordingSession::authenticated()), quiet()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.resolve(7, None).await })
        })
        .collect();

    let mut delivered = 0;
    for handle in handles {
        if matches!(handle.await.unwrap(), ResolveOutcome::Delivered(_)) {
            delivered += 1;
        }
    }
    assert_eq!(delivered, 1);
    mock.assert_async().await;
}
