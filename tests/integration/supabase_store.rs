//! `SupabaseStore` against a mock Storage API.

use pdfmerge::config::{PublishOptions, SupabaseConfig};
use pdfmerge::pipeline::{MergeRequest, Pipeline};
use pdfmerge::storage::{ObjectStore, StorageError, SupabaseStore};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{page_tags, pdf};

const KEY: &str = "service-role-key";

fn store(server: &MockServer) -> SupabaseStore {
    SupabaseStore::new(&SupabaseConfig {
        url: server.uri(),
        service_key: KEY.to_string(),
        bucket: "print-queue".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_download_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/print-queue/orders/1/batch_1.pdf"))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .and(header("apikey", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 body".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = store(&server).download("orders/1/batch_1.pdf").await.unwrap();
    assert_eq!(bytes, b"%PDF-1.7 body".to_vec());
}

#[tokio::test]
async fn test_download_error_uses_storage_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/print-queue/missing.pdf"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": "404",
            "error": "not_found",
            "message": "Object not found",
        })))
        .mount(&server)
        .await;

    let err = store(&server).download("missing.pdf").await.unwrap_err();
    assert_eq!(err, StorageError::read("missing.pdf", "Object not found"));
}

#[tokio::test]
async fn test_download_error_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = store(&server).download("a.pdf").await.unwrap_err();
    assert!(err.to_string().contains("502"), "unexpected message: {err}");
}

#[tokio::test]
async fn test_upload_sets_upsert_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/print-queue/temp/o/merged_a4.pdf"))
        .and(header("x-upsert", "true"))
        .and(header("content-type", "application/pdf"))
        .and(header("apikey", KEY))
        .and(body_bytes(b"merged".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "print-queue/temp/o/merged_a4.pdf"})))
        .expect(1)
        .mount(&server)
        .await;

    store(&server)
        .upload("temp/o/merged_a4.pdf", b"merged".to_vec(), "application/pdf", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_conflict_is_write_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-upsert", "false"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "statusCode": "409",
            "error": "Duplicate",
            "message": "The resource already exists",
        })))
        .mount(&server)
        .await;

    let err = store(&server)
        .upload("a.pdf", b"x".to_vec(), "application/pdf", false)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Write { .. }));
    assert_eq!(err.to_string(), "The resource already exists");
}

#[tokio::test]
async fn test_pipeline_over_supabase() {
    let server = MockServer::start().await;
    for (name, pages) in [("one", 1), ("two", 2)] {
        Mock::given(method("GET"))
            .and(path(format!("/storage/v1/object/print-queue/batches/{name}.pdf")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf(name, pages)))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/print-queue/temp/ord_5/merged_a5.pdf"))
        .and(header("x-upsert", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(store(&server));
    let request = MergeRequest::new(
        vec!["batches/one.pdf".to_string(), "batches/two.pdf".to_string()],
        "ord_5",
        "a5",
    );
    let result = Pipeline::new(store, &PublishOptions::default())
        .run(request)
        .await
        .unwrap();

    assert_eq!(result.page_count, 3);

    let received = server.received_requests().await.unwrap();
    let upload = received
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    assert_eq!(upload.body.len() as u64, result.size_bytes);
    assert_eq!(page_tags(&upload.body), vec!["one-1", "two-1", "two-2"]);
}
