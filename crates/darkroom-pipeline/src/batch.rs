//! All-or-fail concurrent object commit.
//!
//! Every write-side operation funnels its objects through [`commit_batch`]:
//! one task per object, each bounded by the pipeline's upload timeout. The
//! first failure aborts the remaining siblings and triggers best-effort
//! rollback deletes for the whole batch. Aborted siblings have unknown
//! server-side outcome, which is why rollback covers every key in the
//! batch rather than only the ones that reported success.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use darkroom_store::{ObjectGateway, StoreError};

use crate::PipelineError;

/// One object in a batch commit.
pub(crate) struct BatchObject {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub metadata: Option<HashMap<String, String>>,
}

impl BatchObject {
    pub fn new(key: String, bytes: Vec<u8>, content_type: &str) -> Self {
        Self {
            key,
            bytes,
            content_type: content_type.to_string(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Commit every object or none: writes run concurrently, each bounded by
/// `timeout`. On any failure the remaining writes are aborted, rollback
/// deletes are issued for the whole batch, and the first error is returned.
pub(crate) async fn commit_batch(
    store: &Arc<dyn ObjectGateway>,
    objects: Vec<BatchObject>,
    timeout: Duration,
) -> Result<(), PipelineError> {
    let keys: Vec<String> = objects.iter().map(|o| o.key.clone()).collect();

    let mut tasks = JoinSet::new();
    for object in objects {
        let store = Arc::clone(store);
        tasks.spawn(async move {
            let BatchObject {
                key,
                bytes,
                content_type,
                metadata,
            } = object;
            let write = store.put(&key, bytes, &content_type, metadata);
            match tokio::time::timeout(timeout, write).await {
                Ok(Ok(())) => Ok(key),
                Ok(Err(e)) => Err((key, PipelineError::Storage(e))),
                Err(_) => Err((key, PipelineError::UploadTimeout(timeout))),
            }
        });
    }

    let mut first_failure: Option<PipelineError> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(key)) => debug!(key = %key, "object committed"),
            Ok(Err((key, error))) => {
                if first_failure.is_none() {
                    warn!(key = %key, error = %error, "object write failed, aborting siblings");
                    first_failure = Some(error);
                    tasks.abort_all();
                } else {
                    debug!(key = %key, error = %error, "sibling write also failed");
                }
            }
            // Aborted sibling: outcome unknown, rollback below covers it.
            Err(join_error) if join_error.is_cancelled() => {}
            Err(join_error) => std::panic::resume_unwind(join_error.into_panic()),
        }
    }

    let Some(error) = first_failure else {
        return Ok(());
    };

    rollback(store, &keys).await;
    Err(error)
}

/// Best-effort deletes after a failed batch. A delete that fails leaves an
/// orphaned object; log the key loudly so it can be reconciled later.
async fn rollback(store: &Arc<dyn ObjectGateway>, keys: &[String]) {
    for key in keys {
        match store.delete(key).await {
            Ok(()) => debug!(key = %key, "rolled back batch object"),
            Err(StoreError::NotFound(_)) => {}
            Err(error) => {
                warn!(key = %key, error = %error, "rollback delete failed, object orphaned");
            }
        }
    }
}
