//! Pipeline error taxonomy.
//!
//! Callers route on these: validation and decode failures mean the request
//! was bad and nothing was written; storage and metadata failures mean the
//! system misbehaved partway through an otherwise valid request.

use std::time::Duration;

use thiserror::Error;

use darkroom_crypto::EnvelopeError;
use darkroom_media::MediaError;
use darkroom_meta::MetaError;
use darkroom_store::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request was malformed. Raised before any side effect: nothing
    /// was written to the store or the metadata tables.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The image payload could not be decoded. Blocks the upload entirely;
    /// no partial object set is ever written for an undecodable image.
    #[error("image payload rejected: {0}")]
    ImageDecode(#[from] MediaError),

    /// The object gateway failed. Any sibling objects from the same batch
    /// have been rolled back.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// No document exists for the requested scope.
    #[error("no document stored for scope {0}")]
    NotFound(String),

    /// The stored object is missing or carries an unusable key envelope.
    #[error("document envelope invalid: {0}")]
    Envelope(#[from] EnvelopeError),

    /// The envelope was intact but the stored bytes did not decrypt and
    /// parse back into a document.
    #[error("document for scope {scope_id} is corrupt: {reason}")]
    CorruptDocument { scope_id: String, reason: String },

    /// Objects committed but the row write failed. The stored objects are
    /// left in place for reconciliation.
    #[error("metadata write failed: {0}")]
    MetadataWrite(#[from] MetaError),

    /// An object write exceeded the per-batch bound. The batch has been
    /// rolled back.
    #[error("object upload timed out after {0:?}")]
    UploadTimeout(Duration),
}

impl PipelineError {
    /// Whether the caller supplied a bad request, as opposed to the system
    /// failing on a good one. Drives exit codes and HTTP status mapping.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ImageDecode(_) | Self::NotFound(_)
        )
    }
}

// ─────────────────────────────── Tests ───────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_fault_split() {
        assert!(PipelineError::Validation("bad".into()).is_caller_fault());
        assert!(PipelineError::NotFound("p1".into()).is_caller_fault());
        assert!(!PipelineError::UploadTimeout(Duration::from_secs(30)).is_caller_fault());
        assert!(!PipelineError::CorruptDocument {
            scope_id: "p1".into(),
            reason: "decrypt failed".into(),
        }
        .is_caller_fault());
    }

    #[test]
    fn test_display_names_the_scope() {
        let err = PipelineError::NotFound("proj42".into());
        assert!(err.to_string().contains("proj42"));
    }
}
