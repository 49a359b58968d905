//! Object-store gateway: put/get/delete with content type and user metadata
//!
//! Contract notes:
//! - one attempt per call — retries belong to callers
//! - same-key writes silently overwrite; there is no existence check
//! - a missing key on read maps to [`StoreError::NotFound`], everything else
//!   to [`StoreError::Backend`] with the source preserved

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use opendal::Operator;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend error on {key}: {source}")]
    Backend {
        key: String,
        #[source]
        source: opendal::Error,
    },
}

/// An object as fetched from the store: body plus the write-time attributes.
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Capability surface the pipeline needs from object storage.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Write an object, silently overwriting any previous bytes at `key`.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<(), StoreError>;

    /// Fetch an object's bytes together with its content type and metadata.
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// Remove an object; removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
}

// ── OpenDAL-backed store ──────────────────────────────────────────────────────

/// Production gateway over an OpenDAL [`Operator`] (S3-compatible backends).
#[derive(Clone)]
pub struct ObjectStore {
    op: Operator,
}

impl ObjectStore {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    /// The underlying operator, for health probes.
    pub fn operator(&self) -> &Operator {
        &self.op
    }
}

#[async_trait]
impl ObjectGateway for ObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<(), StoreError> {
        let size = bytes.len();
        let mut write = self.op.write_with(key, bytes).content_type(content_type);
        if let Some(user_metadata) = metadata {
            write = write.user_metadata(user_metadata);
        }
        write.await.map_err(|e| map_opendal_err(key, e))?;
        debug!(key, size, content_type, "stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let meta = self.op.stat(key).await.map_err(|e| map_opendal_err(key, e))?;
        let buffer = self.op.read(key).await.map_err(|e| map_opendal_err(key, e))?;
        Ok(StoredObject {
            bytes: buffer.to_vec(),
            content_type: meta.content_type().map(str::to_string),
            metadata: meta.user_metadata().cloned().unwrap_or_default(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.op.delete(key).await.map_err(|e| map_opendal_err(key, e))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.op.exists(key).await.map_err(|e| map_opendal_err(key, e))
    }
}

fn map_opendal_err(key: &str, err: opendal::Error) -> StoreError {
    if err.kind() == opendal::ErrorKind::NotFound {
        StoreError::NotFound(key.to_string())
    } else {
        StoreError::Backend {
            key: key.to_string(),
            source: err,
        }
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// In-memory gateway with the same metadata semantics as the S3 path.
///
/// For tests and local experiments. OpenDAL's memory service is not a
/// substitute here: user metadata on writes is capability-gated per service,
/// and the pipeline's round-trip behavior leans on it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }

    /// All stored keys, sorted — handy for assertions.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectGateway for MemoryStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<(), StoreError> {
        let object = StoredObject {
            bytes,
            content_type: Some(content_type.to_string()),
            metadata: metadata.unwrap_or_default(),
        };
        self.objects.lock().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.objects.lock().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.objects.lock().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_memory_put_get_roundtrip() {
        let store = MemoryStore::new();
        store
            .put(
                "public/users/files/u1/a.bin",
                vec![1, 2, 3],
                "application/octet-stream",
                Some(metadata_of(&[("enc-key", "aa"), ("enc-iv", "bb")])),
            )
            .await
            .unwrap();

        let object = store.get("public/users/files/u1/a.bin").await.unwrap();
        assert_eq!(object.bytes, vec![1, 2, 3]);
        assert_eq!(object.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(object.metadata["enc-key"], "aa");
        assert_eq!(object.metadata["enc-iv"], "bb");
    }

    #[tokio::test]
    async fn test_memory_overwrite_is_silent_and_total() {
        let store = MemoryStore::new();
        store
            .put("k", vec![1], "text/plain", Some(metadata_of(&[("a", "1")])))
            .await
            .unwrap();
        store.put("k", vec![2, 2], "image/jpeg", None).await.unwrap();

        let object = store.get("k").await.unwrap();
        assert_eq!(object.bytes, vec![2, 2]);
        assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
        assert!(
            object.metadata.is_empty(),
            "overwrite replaces metadata, not merges it"
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_missing_key_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(key) if key == "nope"));
    }

    #[tokio::test]
    async fn test_memory_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put("k", vec![1], "text/plain", None).await.unwrap();

        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();

        assert!(!store.exists("k").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_keys_sorted() {
        let store = MemoryStore::new();
        store.put("b", vec![], "t", None).await.unwrap();
        store.put("a", vec![], "t", None).await.unwrap();
        store.put("c", vec![], "t", None).await.unwrap();

        assert_eq!(store.keys().await, vec!["a", "b", "c"]);
    }
}
