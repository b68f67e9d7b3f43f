//! End-to-end pipeline runs against the in-memory store.

use pdfmerge::config::PublishOptions;
use pdfmerge::error::{ErrorKind, MergeError};
use pdfmerge::pipeline::{MergeRequest, Pipeline, PipelineState};
use pdfmerge::storage::{LocalStore, StoreOp};
use rstest::rstest;
use std::sync::Arc;

use crate::common::{batch_path, expected_tags, page_tags, pdf, seeded_store};

fn request(tags: &[&str], group: &str, format: &str) -> MergeRequest {
    MergeRequest::new(tags.iter().map(|t| batch_path(t)).collect(), group, format)
}

#[tokio::test]
async fn test_two_batches_in_order() {
    let store = seeded_store(&[("first", 2), ("second", 3)]).await;
    let mut pipeline = Pipeline::new(store.clone(), &PublishOptions::default());

    let result = pipeline
        .run(request(&["first", "second"], "ord_1", "a5"))
        .await
        .unwrap();

    assert_eq!(result.output_path, "temp/ord_1/merged_a5.pdf");
    assert_eq!(result.page_count, 5);

    let stored = store.get(&result.output_path).await.unwrap();
    assert_eq!(stored.len() as u64, result.size_bytes);
    assert_eq!(
        page_tags(&stored),
        vec!["first-1", "first-2", "second-1", "second-2", "second-3"]
    );
}

#[rstest]
#[case(vec![("a", 1)])]
#[case(vec![("a", 3), ("b", 1), ("c", 2)])]
#[case(vec![("a", 1), ("b", 1), ("c", 1), ("d", 1), ("e", 1), ("f", 1)])]
#[tokio::test]
async fn test_page_positions(#[case] specs: Vec<(&'static str, u32)>) {
    let store = seeded_store(&specs).await;
    let tags: Vec<&str> = specs.iter().map(|(t, _)| *t).collect();

    let result = Pipeline::new(store.clone(), &PublishOptions::default())
        .run(request(&tags, "g", "f"))
        .await
        .unwrap();

    let total: u32 = specs.iter().map(|(_, p)| p).sum();
    assert_eq!(result.page_count, total as usize);
    assert_eq!(
        page_tags(&store.get(&result.output_path).await.unwrap()),
        expected_tags(&specs)
    );
}

#[tokio::test]
async fn test_permuted_sources_change_page_order() {
    let store = seeded_store(&[("a", 2), ("b", 1)]).await;

    let forward = Pipeline::new(store.clone(), &PublishOptions::default())
        .run(request(&["a", "b"], "forward", "f"))
        .await
        .unwrap();
    let backward = Pipeline::new(store.clone(), &PublishOptions::default())
        .run(request(&["b", "a"], "backward", "f"))
        .await
        .unwrap();

    assert_eq!(
        page_tags(&store.get(&forward.output_path).await.unwrap()),
        vec!["a-1", "a-2", "b-1"]
    );
    assert_eq!(
        page_tags(&store.get(&backward.output_path).await.unwrap()),
        vec!["b-1", "a-1", "a-2"]
    );
}

#[tokio::test]
async fn test_republish_overwrites_same_path() {
    let store = seeded_store(&[("a", 1), ("b", 2)]).await;

    let first = Pipeline::new(store.clone(), &PublishOptions::default())
        .run(request(&["a"], "ord_9", "a4"))
        .await
        .unwrap();
    let second = Pipeline::new(store.clone(), &PublishOptions::default())
        .run(request(&["a", "b"], "ord_9", "a4"))
        .await
        .unwrap();

    assert_eq!(first.output_path, second.output_path);
    assert_eq!(
        page_tags(&store.get(&second.output_path).await.unwrap()),
        vec!["a-1", "b-1", "b-2"]
    );
    assert_eq!(store.uploads().await, vec![first.output_path.clone(), first.output_path]);
}

#[tokio::test]
async fn test_empty_source_list_has_no_side_effects() {
    let store = seeded_store(&[("a", 1)]).await;
    let mut pipeline = Pipeline::new(store.clone(), &PublishOptions::default());

    let err = pipeline.run(request(&[], "g", "f")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(store.operations().await.is_empty());
}

#[tokio::test]
async fn test_second_of_three_fetches_fails() {
    let store = seeded_store(&[("a", 1), ("b", 1), ("c", 1)]).await;
    store.fail_reads_of(batch_path("b")).await;
    let mut pipeline = Pipeline::new(store.clone(), &PublishOptions::default());

    let err = pipeline.run(request(&["a", "b", "c"], "g", "f")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert_eq!(err.source_path(), Some("batches/b.pdf"));
    assert_eq!(
        store.operations().await,
        vec![
            StoreOp::Download(batch_path("a")),
            StoreOp::Download(batch_path("b")),
        ]
    );
    assert!(matches!(pipeline.state(), PipelineState::Failed(msg) if msg.contains("batches/b.pdf")));
}

#[tokio::test]
async fn test_malformed_third_source_is_not_published() {
    let store = seeded_store(&[("a", 1), ("b", 1)]).await;
    store.insert(batch_path("c"), b"GIF89a....".to_vec()).await;

    let err = Pipeline::new(store.clone(), &PublishOptions::default())
        .run(request(&["a", "b", "c"], "g", "f"))
        .await
        .unwrap_err();

    match err {
        MergeError::Decode { index, ref path, .. } => {
            assert_eq!(index, 2);
            assert_eq!(path, "batches/c.pdf");
        }
        ref other => panic!("expected decode error, got {other:?}"),
    }
    assert!(store.uploads().await.is_empty());
    assert_eq!(store.operations().await.len(), 3);
}

#[tokio::test]
async fn test_uncompressed_output_still_decodes() {
    let store = seeded_store(&[("a", 2)]).await;
    let options = PublishOptions {
        prefix: "merged".to_string(),
        compress: false,
    };

    let result = Pipeline::new(store.clone(), &options)
        .run(request(&["a"], "g", "letter"))
        .await
        .unwrap();

    assert_eq!(result.output_path, "merged/g/merged_letter.pdf");
    assert_eq!(
        page_tags(&store.get(&result.output_path).await.unwrap()),
        vec!["a-1", "a-2"]
    );
}

#[tokio::test]
async fn test_pipeline_over_local_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("batches")).unwrap();
    std::fs::write(dir.path().join("batches/x.pdf"), pdf("x", 1)).unwrap();
    std::fs::write(dir.path().join("batches/y.pdf"), pdf("y", 2)).unwrap();

    let store = Arc::new(LocalStore::new(dir.path()));
    let result = Pipeline::new(store, &PublishOptions::default())
        .run(request(&["x", "y"], "ord_3", "a4"))
        .await
        .unwrap();

    let written = std::fs::read(dir.path().join("temp/ord_3/merged_a4.pdf")).unwrap();
    assert_eq!(written.len() as u64, result.size_bytes);
    assert_eq!(page_tags(&written), vec!["x-1", "y-1", "y-2"]);
}
