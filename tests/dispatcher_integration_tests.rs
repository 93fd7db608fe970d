//! Integration Tests for the Dispatcher
//!
//! Runs the reqwest transport against a mockito upstream and counts the
//! attempts each scenario makes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};
use remote_cache::cache::{shared, CacheStore};
use remote_cache::{
    Dispatcher, ErrorKind, HttpTransport, QueryParams, RetryPolicy, TtlPolicy,
};
use serde_json::json;

// == Helper Functions ==

fn dispatcher_for(base_url: &str, max_keys: usize) -> Dispatcher<HttpTransport> {
    let transport = HttpTransport::new(base_url).unwrap();
    Dispatcher::new(transport, shared(CacheStore::new(max_keys)))
        .with_ttl_policy(TtlPolicy::new(300))
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
        .with_request_timeout(Duration::from_secs(5))
}

fn item_42() -> QueryParams {
    QueryParams::new().with("id", "42")
}

// == Retry Behaviour ==

#[tokio::test]
async fn test_continuous_503_makes_four_attempts() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/items")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body(r#"{"message":"maintenance"}"#)
        .expect(4)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server.url(), 100);
    let err = dispatcher.fetch("/items", &item_42()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert_eq!(err.status, Some(503));
    assert_eq!(err.message, "maintenance");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/items")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error":{"message":"no item 42"}}"#)
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server.url(), 100);
    let err = dispatcher.fetch("/items", &item_42()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "no item 42");
    assert_eq!(err.context.get("id").map(String::as_str), Some("42"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_401_is_unauthorized() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/items")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server.url(), 100);
    let err = dispatcher.fetch("/items", &QueryParams::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unauthorized);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/items")
        .with_status(500)
        .expect(4)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server.url(), 100);
    assert!(dispatcher.fetch("/items", &QueryParams::new()).await.is_err());
    failing.assert_async().await;
    assert_eq!(dispatcher.stats().await.keys, 0);
}

// == Caching ==

#[tokio::test]
async fn test_end_to_end_item_fetch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/items")
        .match_query(Matcher::UrlEncoded("id".into(), "42".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"item":{"id":"42"}}}"#)
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server.url(), 100);

    let first = dispatcher.fetch("/items", &item_42()).await.unwrap();
    assert_eq!(first, json!({"data": {"item": {"id": "42"}}}));

    {
        let cache = dispatcher.cache().read().await;
        let entry = cache.entries().next().unwrap();
        assert_eq!(entry.key, "/items?id=42");
        assert_eq!(entry.expires_at - entry.inserted_at, Duration::from_secs(900));
    }

    let hits_before = dispatcher.stats().await.hits;
    let second = dispatcher.fetch("/items", &item_42()).await.unwrap();

    assert_eq!(second, first);
    assert_eq!(dispatcher.stats().await.hits, hits_before + 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_capacity_degradation() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/first")
        .with_status(200)
        .with_body(r#"{"n":1}"#)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/second")
        .with_status(200)
        .with_body(r#"{"n":2}"#)
        .expect(2)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server.url(), 1);

    assert_eq!(dispatcher.fetch("/first", &QueryParams::new()).await.unwrap(), json!({"n": 1}));
    assert_eq!(dispatcher.fetch("/second", &QueryParams::new()).await.unwrap(), json!({"n": 2}));
    assert_eq!(dispatcher.fetch("/second", &QueryParams::new()).await.unwrap(), json!({"n": 2}));

    let stats = dispatcher.stats().await;
    assert_eq!(stats.keys, 1);
    assert_eq!(stats.rejected, 2);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_parameter_order_shares_cache_slot() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "rust".into()),
            Matcher::UrlEncoded("lang".into(), "en".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server.url(), 100);
    let a = QueryParams::new().with("q", "rust").with("lang", "en");
    let b = QueryParams::new().with("lang", "en").with("q", "rust").with_opt("page", None::<u32>);

    dispatcher.fetch("/search", &a).await.unwrap();
    dispatcher.fetch("/search", &b).await.unwrap();
    mock.assert_async().await;
}

// == Transport ==

#[tokio::test]
async fn test_credential_header_is_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/items")
        .match_header("x-api-key", "secret")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let transport = HttpTransport::new(server.url())
        .unwrap()
        .with_credential("x-api-key", "secret")
        .unwrap();
    let dispatcher = Dispatcher::new(transport, shared(CacheStore::new(10)));

    dispatcher.fetch("/items", &QueryParams::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_timeout_is_retried_then_classified() {
    // Accepts connections and never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });

    let dispatcher = dispatcher_for(&format!("http://{}", addr), 100)
        .with_retry_policy(RetryPolicy::new(1, Duration::from_millis(1)))
        .with_request_timeout(Duration::from_millis(200));

    let err = dispatcher.fetch("/slow", &QueryParams::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(err.status, None);
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
    server.abort();
}

#[tokio::test]
async fn test_connection_refused_is_internal() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dispatcher = dispatcher_for(&format!("http://{}", addr), 100)
        .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1)));

    let err = dispatcher.fetch("/items", &QueryParams::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(err.status, None);
}
