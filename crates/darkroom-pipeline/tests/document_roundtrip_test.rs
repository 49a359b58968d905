//! Integration tests for encrypted document save/read.
//!
//! Verifies the exact JSON round-trip, that the stored object is
//! self-contained (bytes plus envelope decrypt with no out-of-band state),
//! the overwrite semantics, the IV policy split, and the read-path error
//! classes: missing scope, stripped envelope, corrupt ciphertext.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;

use darkroom_crypto::{cipher, Envelope};
use darkroom_meta::MemoryMetadataStore;
use darkroom_pipeline::{CryptoPolicy, Pipeline, PipelineError, DOCUMENT_CONTENT_TYPE};
use darkroom_store::{MemoryStore, ObjectGateway};

fn policy() -> CryptoPolicy {
    CryptoPolicy::new(SecretString::from("process-salt")).with_iterations(100)
}

fn pipeline_with(store: &MemoryStore, policy: CryptoPolicy) -> Pipeline {
    Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(MemoryMetadataStore::new()),
        policy,
    )
}

#[tokio::test]
async fn document_roundtrip_is_exact() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());

    let document = json!({"a": 1});
    let object_key = pipeline
        .save_document("proj42", &document)
        .await
        .expect("save should succeed");
    assert_eq!(object_key, "public/users/album/proj42_data.json");

    let read_back = pipeline
        .read_document("proj42")
        .await
        .expect("read should succeed");
    assert_eq!(read_back, document);
}

#[tokio::test]
async fn stored_object_is_self_contained() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());

    let document = json!({"pages": [{"id": 1}], "title": "summer album"});
    let object_key = pipeline
        .save_document("proj42", &document)
        .await
        .expect("save should succeed");

    // Decrypt using nothing but the stored object: body plus envelope.
    let object = store.get(&object_key).await.unwrap();
    assert_eq!(object.content_type.as_deref(), Some(DOCUMENT_CONTENT_TYPE));

    let envelope = Envelope::from_metadata(&object.metadata).expect("envelope should be present");
    let plaintext = cipher::decrypt(
        &object.bytes,
        &envelope.key().unwrap(),
        &envelope.iv().unwrap(),
    )
    .expect("stored ciphertext should decrypt with its own envelope");

    let recovered: serde_json::Value = serde_json::from_slice(&plaintext).unwrap();
    assert_eq!(recovered, document);
    assert_ne!(object.bytes, plaintext, "body on the wire must be ciphertext");
}

#[tokio::test]
async fn save_overwrites_previous_document() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());

    pipeline
        .save_document("proj42", &json!({"version": 1}))
        .await
        .expect("first save should succeed");
    pipeline
        .save_document("proj42", &json!({"version": 2}))
        .await
        .expect("second save should succeed");

    assert_eq!(store.len().await, 1, "one scope, one object");
    let read_back = pipeline.read_document("proj42").await.unwrap();
    assert_eq!(read_back, json!({"version": 2}));
}

#[tokio::test]
async fn random_iv_policy_varies_ciphertext() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());
    let document = json!({"a": 1});

    let key = pipeline.save_document("proj42", &document).await.unwrap();
    let first = store.get(&key).await.unwrap();
    pipeline.save_document("proj42", &document).await.unwrap();
    let second = store.get(&key).await.unwrap();

    assert_ne!(
        first.bytes, second.bytes,
        "fresh IVs must produce fresh ciphertext for identical documents"
    );
    assert_ne!(first.metadata["enc-iv"], second.metadata["enc-iv"]);
    // Still reads back fine after the rewrite
    assert_eq!(pipeline.read_document("proj42").await.unwrap(), document);
}

#[tokio::test]
async fn deterministic_iv_policy_reproduces_ciphertext() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy().with_deterministic_iv(true));
    let document = json!({"a": 1});

    let key = pipeline.save_document("proj42", &document).await.unwrap();
    let first = store.get(&key).await.unwrap();
    pipeline.save_document("proj42", &document).await.unwrap();
    let second = store.get(&key).await.unwrap();

    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.metadata["enc-iv"], second.metadata["enc-iv"]);
}

#[tokio::test]
async fn missing_scope_is_not_found() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());

    let err = pipeline.read_document("ghost").await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(scope) if scope == "ghost"));
}

#[tokio::test]
async fn stripped_envelope_is_an_envelope_error() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());

    let key = pipeline
        .save_document("proj42", &json!({"a": 1}))
        .await
        .unwrap();

    // Rewrite the object without its metadata, as a foreign writer would.
    let object = store.get(&key).await.unwrap();
    store
        .put(&key, object.bytes, DOCUMENT_CONTENT_TYPE, None)
        .await
        .unwrap();

    let err = pipeline.read_document("proj42").await.unwrap_err();
    assert!(matches!(err, PipelineError::Envelope(_)));
}

#[tokio::test]
async fn truncated_ciphertext_is_a_corrupt_document() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());

    let key = pipeline
        .save_document("proj42", &json!({"a": 1}))
        .await
        .unwrap();

    let object = store.get(&key).await.unwrap();
    let mut bytes = object.bytes;
    bytes.truncate(8); // no longer block-aligned
    store
        .put(&key, bytes, DOCUMENT_CONTENT_TYPE, Some(object.metadata))
        .await
        .unwrap();

    let err = pipeline.read_document("proj42").await.unwrap_err();
    assert!(matches!(err, PipelineError::CorruptDocument { ref scope_id, .. } if scope_id == "proj42"));
    assert!(!err.is_caller_fault(), "corrupt storage is not the caller's fault");
}

#[tokio::test]
async fn null_document_rejected() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());

    let err = pipeline
        .save_document("proj42", &serde_json::Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn empty_scope_rejected() {
    let store = MemoryStore::new();
    let pipeline = pipeline_with(&store, policy());

    let err = pipeline.save_document("", &json!({})).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));

    let err = pipeline.read_document("").await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}
