//! HTTP API tests against a spawned server.

use futures::future::join_all;
use pdfmerge::config::Config;
use pdfmerge::server::{ErrorBody, HealthResponse, MergeResponse, SECRET_HEADER};
use serde_json::{Value, json};

use crate::common::{SECRET, TestServer, batch_path, page_tags, seeded_store};

fn merge_body(tags: &[&str], order_id: &str, format: &str) -> Value {
    json!({
        "storagePaths": tags.iter().map(|t| batch_path(t)).collect::<Vec<_>>(),
        "orderId": order_id,
        "format": format,
        "orderNumber": "A-1042",
    })
}

async fn post_merge(server: &TestServer, secret: Option<&str>, body: &Value) -> reqwest::Response {
    let mut request = reqwest::Client::new().post(server.url("/merge")).json(body);
    if let Some(secret) = secret {
        request = request.header(SECRET_HEADER, secret);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start(seeded_store(&[]).await).await;

    let resp = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: HealthResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "ok");
    assert_eq!(body.service, "pdfmerge");

    server.stop().await;
}

#[tokio::test]
async fn test_merge_success() {
    let store = seeded_store(&[("a", 2), ("b", 3)]).await;
    let server = TestServer::start(store.clone()).await;

    let resp = post_merge(&server, Some(SECRET), &merge_body(&["a", "b"], "ord_1", "a5")).await;
    assert_eq!(resp.status(), 200);

    let body: MergeResponse = resp.json().await.unwrap();
    assert_eq!(body.storage_path, "temp/ord_1/merged_a5.pdf");
    assert_eq!(body.pages, 5);

    let stored = store.get(&body.storage_path).await.unwrap();
    assert_eq!(stored.len() as u64, body.size);
    assert_eq!(page_tags(&stored), vec!["a-1", "a-2", "b-1", "b-2", "b-3"]);

    server.stop().await;
}

#[tokio::test]
async fn test_merge_response_field_names() {
    let store = seeded_store(&[("a", 1)]).await;
    let server = TestServer::start(store).await;

    let resp = post_merge(&server, Some(SECRET), &merge_body(&["a"], "o", "f")).await;
    let body: Value = resp.json().await.unwrap();

    let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["pages", "size", "storagePath"]);

    server.stop().await;
}

#[tokio::test]
async fn test_missing_or_wrong_secret_is_unauthorized() {
    let store = seeded_store(&[("a", 1)]).await;
    let server = TestServer::start(store.clone()).await;
    let body = merge_body(&["a"], "o", "f");

    for secret in [None, Some("nope"), Some("")] {
        let resp = post_merge(&server, secret, &body).await;
        assert_eq!(resp.status(), 401);
        let err: ErrorBody = resp.json().await.unwrap();
        assert_eq!(err.error, "Unauthorized");
    }

    assert!(store.operations().await.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_secret_is_checked_before_body() {
    let server = TestServer::start(seeded_store(&[]).await).await;

    let resp = reqwest::Client::new()
        .post(server.url("/merge"))
        .body("{definitely not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_bodies_are_bad_requests() {
    let store = seeded_store(&[("a", 1)]).await;
    let server = TestServer::start(store.clone()).await;

    for body in [
        json!({}),
        json!({"storagePaths": [], "orderId": "o", "format": "f"}),
        json!({"storagePaths": "batches/a.pdf", "orderId": "o", "format": "f"}),
    ] {
        let resp = post_merge(&server, Some(SECRET), &body).await;
        assert_eq!(resp.status(), 400);
        let err: ErrorBody = resp.json().await.unwrap();
        assert_eq!(err.error, "storagePaths is required and must be a non-empty array");
    }

    let resp = post_merge(&server, Some(SECRET), &merge_body(&["a"], "../x", "f")).await;
    assert_eq!(resp.status(), 400);

    assert!(store.operations().await.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_fetch_failure_is_server_error() {
    let store = seeded_store(&[("a", 1), ("c", 1)]).await;
    let server = TestServer::start(store.clone()).await;

    let resp = post_merge(&server, Some(SECRET), &merge_body(&["a", "b", "c"], "o", "f")).await;
    assert_eq!(resp.status(), 500);

    let err: ErrorBody = resp.json().await.unwrap();
    assert_eq!(err.error, "Failed to download batches/b.pdf: Object not found");
    assert!(store.uploads().await.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_publish_failure_is_server_error() {
    let store = seeded_store(&[("a", 1)]).await;
    store.fail_writes().await;
    let server = TestServer::start(store).await;

    let resp = post_merge(&server, Some(SECRET), &merge_body(&["a"], "o", "f")).await;
    assert_eq!(resp.status(), 500);

    let err: ErrorBody = resp.json().await.unwrap();
    assert!(err.error.starts_with("Failed to upload merged PDF to temp/o/merged_f.pdf"));

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests_are_isolated() {
    let specs: Vec<(String, u32)> = (1..=6).map(|i| (format!("s{i}"), i)).collect();
    let borrowed: Vec<(&str, u32)> = specs.iter().map(|(t, p)| (t.as_str(), *p)).collect();
    let store = seeded_store(&borrowed).await;
    let server = TestServer::start(store.clone()).await;

    let requests = (1..=6).map(|i| {
        let first = format!("s{i}");
        let second = format!("s{}", 7 - i);
        let body = merge_body(&[first.as_str(), second.as_str()], &format!("ord_{i}"), "a4");
        let server = &server;
        async move { (i, post_merge(server, Some(SECRET), &body).await) }
    });

    for (i, resp) in join_all(requests).await {
        assert_eq!(resp.status(), 200);
        let body: MergeResponse = resp.json().await.unwrap();
        assert_eq!(body.storage_path, format!("temp/ord_{i}/merged_a4.pdf"));
        assert_eq!(body.pages, 7);

        let tags = page_tags(&store.get(&body.storage_path).await.unwrap());
        assert_eq!(tags.first().unwrap(), &format!("s{i}-1"));
        assert_eq!(tags.last().unwrap(), &format!("s{}-{}", 7 - i, 7 - i));
    }

    server.stop().await;
}

#[tokio::test]
async fn test_body_limit_is_enforced() {
    let mut config = Config::for_memory(SECRET);
    config.max_body_bytes = 64;
    let server = TestServer::start_with(config, seeded_store(&[]).await).await;

    let long_paths: Vec<String> = (0..20).map(|i| format!("batches/{i}.pdf")).collect();
    let body = json!({"storagePaths": long_paths, "orderId": "o", "format": "f"});

    let resp = post_merge(&server, Some(SECRET), &body).await;
    assert_eq!(resp.status(), 413);

    server.stop().await;
}
