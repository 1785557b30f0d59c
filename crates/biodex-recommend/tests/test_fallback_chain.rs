//! Fallback chain: primary strategy, then the public catalog.

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Mock, Server, ServerGuard};
use pretty_assertions::assert_eq;

use biodex_common::confidence::{FALLBACK_BASE, FALLBACK_SPREAD};
use biodex_common::StrategyKind;
use biodex_ingestion::sources::{BackendClient, BackendConfig, CatalogClient, CatalogConfig};
use biodex_recommend::{FallbackChain, ResolutionStatus, StrategyClient, StrategyRequest};
use biodex_test_utils::{backend_item, catalog_taxon, envelope, RecordingSession};

fn chain(server: &ServerGuard, session: Arc<RecordingSession>) -> FallbackChain {
    let backend_config = BackendConfig { base_url: format!("{}/api", server.url()), ..Default::default() };
    chain_with_backend(server, backend_config, session)
}

fn chain_with_backend(server: &ServerGuard, backend_config: BackendConfig, session: Arc<RecordingSession>) -> FallbackChain {
    let backend = BackendClient::new(backend_config, session).unwrap();
    let catalog_config = CatalogConfig { base_url: format!("{}/v1", server.url()), ..Default::default() };
    let catalog = CatalogClient::new(catalog_config).unwrap();
    FallbackChain::new(Arc::new(StrategyClient::new(Arc::new(backend))), Arc::new(catalog))
}

async fn catalog_mock(server: &mut ServerGuard, expected: usize) -> Mock {
    server
        .mock("GET", "/v1/taxa")
        .match_query(Matcher::UrlEncoded("iconic_taxa".into(), "Aves".into()))
        .with_status(200)
        .with_body(envelope(vec![
            catalog_taxon(7, "Carduelis carduelis", Some("Pintassilgo"), "Aves"),
            catalog_taxon(11, "Turdus merula", Some("Melro"), "Aves"),
            catalog_taxon(12, "Passer domesticus", Some("Pardal"), "Aves"),
        ]))
        .expect(expected)
        .create_async()
        .await
}

fn related(subject: u64) -> StrategyRequest {
    StrategyRequest::ContentBased { subject, limit: 5, group: Some("Aves".into()) }
}

#[tokio::test]
async fn test_primary_failure_with_group_falls_back_once() {
    let mut server = Server::new_async().await;
    let primary = server
        .mock("GET", "/api/recommendations/content-based/7")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    let catalog = catalog_mock(&mut server, 1).await;

    let outcome = chain(&server, Arc::new(RecordingSession::authenticated()))
        .execute(&related(7), Some("birds"))
        .await;

    assert_eq!(outcome.status, ResolutionStatus::Ok);
    assert_eq!(outcome.source, Some(StrategyKind::ExternalFallback));
    let mut ids: Vec<u64> = outcome.records.iter().map(|r| r.taxon_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![11, 12]);
    for record in &outcome.records {
        let c = record.score();
        assert!(c >= FALLBACK_BASE && c < FALLBACK_BASE + FALLBACK_SPREAD);
        assert_eq!(record.reason.as_deref(), Some("popular in Aves"));
    }
    primary.assert_async().await;
    catalog.assert_async().await;
}

#[tokio::test]
async fn test_primary_failure_without_group_is_error_and_no_catalog_call() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/recommendations/collaborative")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    let catalog = catalog_mock(&mut server, 0).await;

    let outcome = chain(&server, Arc::new(RecordingSession::authenticated()))
        .execute(&StrategyRequest::Collaborative { limit: 5 }, None)
        .await;

    assert_eq!(outcome.status, ResolutionStatus::Error);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.source, None);
    catalog.assert_async().await;
}

#[tokio::test]
async fn test_empty_primary_without_group_is_empty() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/recommendations/collaborative")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope(vec![]))
        .create_async()
        .await;

    let outcome = chain(&server, Arc::new(RecordingSession::authenticated()))
        .execute(&StrategyRequest::Collaborative { limit: 5 }, None)
        .await;

    assert_eq!(outcome.status, ResolutionStatus::Empty);
}

#[tokio::test]
async fn test_empty_primary_with_group_uses_catalog() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/recommendations/content-based/7")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope(vec![]))
        .create_async()
        .await;
    let catalog = catalog_mock(&mut server, 1).await;

    let outcome = chain(&server, Arc::new(RecordingSession::authenticated()))
        .execute(&related(7), Some("Aves"))
        .await;

    assert_eq!(outcome.source, Some(StrategyKind::ExternalFallback));
    assert!(outcome.records.iter().all(|r| r.taxon_id != 7));
    catalog.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_primary_never_falls_back() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/recommendations/content-based/7")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;
    let catalog = catalog_mock(&mut server, 0).await;

    let session = Arc::new(RecordingSession::authenticated());
    let outcome = chain(&server, session.clone()).execute(&related(7), Some("Aves")).await;

    assert_eq!(outcome.status, ResolutionStatus::Error);
    assert_eq!(session.expired_calls(), 1);
    catalog.assert_async().await;
}

#[tokio::test]
async fn test_primary_success_skips_catalog() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/recommendations/content-based/7")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope(vec![backend_item(20, "Pisco", "Erithacus rubecula", "Aves")]))
        .create_async()
        .await;
    let catalog = catalog_mock(&mut server, 0).await;

    let outcome = chain(&server, Arc::new(RecordingSession::authenticated()))
        .execute(&related(7), Some("Aves"))
        .await;

    assert_eq!(outcome.status, ResolutionStatus::Ok);
    assert_eq!(outcome.source, Some(StrategyKind::ContentBased));
    catalog.assert_async().await;
}

#[tokio::test]
async fn test_catalog_failure_ends_in_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/recommendations/content-based/7")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let catalog = server
        .mock("GET", "/v1/taxa")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let outcome = chain(&server, Arc::new(RecordingSession::authenticated()))
        .execute(&related(7), Some("Aves"))
        .await;

    assert_eq!(outcome.status, ResolutionStatus::Error);
    catalog.assert_async().await;
}

/// Accepts connections and never answers them.
async fn silent_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/api")
}

#[tokio::test]
async fn test_primary_timeout_falls_back_like_network_failure() {
    let mut server = Server::new_async().await;
    let catalog = catalog_mock(&mut server, 1).await;
    let backend_config = BackendConfig {
        base_url: silent_backend().await,
        batch_timeout: Duration::from_millis(200),
        ..Default::default()
    };

    let session = Arc::new(RecordingSession::authenticated());
    let outcome = chain_with_backend(&server, backend_config, session.clone())
        .execute(&related(7), Some("Aves"))
        .await;

    assert_eq!(outcome.status, ResolutionStatus::Ok);
    assert_eq!(outcome.source, Some(StrategyKind::ExternalFallback));
    assert!(!outcome.records.is_empty());
    assert_eq!(session.expired_calls(), 0);
    catalog.assert_async().await;
}

#[tokio::test]
async fn test_refused_connection_falls_back() {
    let mut server = Server::new_async().await;
    let catalog = catalog_mock(&mut server, 1).await;
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let backend_config = BackendConfig {
        base_url: format!("http://{closed}/api"),
        batch_timeout: Duration::from_secs(2),
        ..Default::default()
    };

    let outcome = chain_with_backend(&server, backend_config, Arc::new(RecordingSession::authenticated()))
        .execute(&related(7), Some("Aves"))
        .await;

    assert_eq!(outcome.status, ResolutionStatus::Ok);
    assert_eq!(outcome.source, Some(StrategyKind::ExternalFallback));
    catalog.assert_async().await;
}

#[tokio::test]
async fn test_primary_timeout_without_group_is_error() {
    let server = Server::new_async().await;
    let backend_config = BackendConfig {
        base_url: silent_backend().await,
        batch_timeout: Duration::from_millis(200),
        ..Default::default()
    };

    let outcome = chain_with_backend(&server, backend_config, Arc::new(RecordingSession::authenticated()))
        .execute(&related(7), None)
        .await;

    assert_eq!(outcome.status, ResolutionStatus::Error);
    assert_eq!(outcome.source, None);
}
