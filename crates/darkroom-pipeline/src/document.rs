//! Encrypted project documents.
//!
//! One scope, one object: saving encrypts the JSON document under the
//! scope-derived key and silently replaces whatever was stored before.
//! The key and IV travel hex-encoded in the object's metadata envelope,
//! so reading needs nothing beyond the stored object itself.

use serde_json::Value;
use tracing::info;

use darkroom_core::document_key;
use darkroom_crypto::{cipher, kdf, Envelope};
use darkroom_store::StoreError;

use crate::batch::{commit_batch, BatchObject};
use crate::{Pipeline, PipelineError};

/// Content type for stored ciphertext. Deliberately not `application/json`:
/// the bytes on the wire are not JSON until decrypted.
pub const DOCUMENT_CONTENT_TYPE: &str = "application/octet-stream";

impl Pipeline {
    /// Encrypt and store the document for a scope, replacing any previous
    /// version. Returns the object key.
    pub async fn save_document(
        &self,
        scope_id: &str,
        document: &Value,
    ) -> Result<String, PipelineError> {
        if scope_id.is_empty() {
            return Err(PipelineError::Validation("scope id must not be empty".into()));
        }
        if document.is_null() {
            return Err(PipelineError::Validation(
                "document payload must not be null".into(),
            ));
        }

        let plaintext = serde_json::to_vec(document)
            .map_err(|e| PipelineError::Validation(format!("document serialization failed: {e}")))?;

        let key = kdf::derive_document_key(&self.crypto.salt, scope_id, self.crypto.iterations);
        let iv = if self.crypto.deterministic_iv {
            kdf::derive_document_iv(&self.crypto.salt, scope_id, self.crypto.iterations)
        } else {
            kdf::random_iv()
        };
        let ciphertext = cipher::encrypt(&plaintext, &key, &iv);
        let envelope = Envelope::new(&key, &iv);

        let object_key = document_key(scope_id);
        let object = BatchObject::new(object_key.clone(), ciphertext, DOCUMENT_CONTENT_TYPE)
            .with_metadata(envelope.to_metadata());
        commit_batch(&self.store, vec![object], self.upload_timeout).await?;

        info!(scope = %scope_id, key = %object_key, "document saved");
        Ok(object_key)
    }

    /// Fetch and decrypt the document for a scope.
    ///
    /// Always hits the store; there is no cache layer. A missing object is
    /// [`PipelineError::NotFound`], a damaged envelope is
    /// [`PipelineError::Envelope`], and anything that fetches but fails to
    /// decrypt-and-parse is [`PipelineError::CorruptDocument`].
    pub async fn read_document(&self, scope_id: &str) -> Result<Value, PipelineError> {
        if scope_id.is_empty() {
            return Err(PipelineError::Validation("scope id must not be empty".into()));
        }

        let object_key = document_key(scope_id);
        let object = match self.store.get(&object_key).await {
            Ok(object) => object,
            Err(StoreError::NotFound(_)) => {
                return Err(PipelineError::NotFound(scope_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let envelope = Envelope::from_metadata(&object.metadata)?;
        let key = envelope.key()?;
        let iv = envelope.iv()?;

        let plaintext = cipher::decrypt(&object.bytes, &key, &iv)
            .map_err(|e| corrupt(scope_id, format!("decrypt failed: {e}")))?;
        let document = serde_json::from_slice(&plaintext)
            .map_err(|e| corrupt(scope_id, format!("decrypted bytes are not a document: {e}")))?;

        Ok(document)
    }
}

fn corrupt(scope_id: &str, reason: String) -> PipelineError {
    PipelineError::CorruptDocument {
        scope_id: scope_id.to_string(),
        reason,
    }
}
