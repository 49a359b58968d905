//! darkroom-pipeline: upload orchestration for the asset store.
//!
//! Every write-side operation follows the same ordering contract:
//! validate the request, transform the payload (derivatives, encryption),
//! commit all objects concurrently with all-or-fail semantics, and only
//! then touch the metadata store. A failed batch rolls its objects back
//! and leaves zero rows behind, so metadata never references objects that
//! were not durably stored.

mod batch;
pub mod document;
mod error;
pub mod payload;
pub mod template;
pub mod upload;

pub use document::DOCUMENT_CONTENT_TYPE;
pub use error::PipelineError;
pub use payload::decode_base64_payload;
pub use template::{SavedTemplate, TemplateSave};
pub use upload::{FileUpload, PhotoUpload, UploadedFile, UploadedPhoto};

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use darkroom_core::config::CryptoConfig;
use darkroom_crypto::DEFAULT_KDF_ITERATIONS;
use darkroom_meta::MetadataStore;
use darkroom_store::ObjectGateway;

/// Default bound on each individual object write within a batch.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// How document keys and IVs are derived for scope encryption.
///
/// The salt is process-wide and secret; the per-scope key falls out of the
/// KDF. IVs are random by default and travel in the object envelope.
/// `deterministic_iv` re-derives the IV from the scope id instead, which
/// reproduces the legacy ciphertext layout byte for byte; it exists for
/// reading back archives written that way and should stay off otherwise.
#[derive(Clone)]
pub struct CryptoPolicy {
    pub(crate) salt: SecretString,
    pub(crate) iterations: u32,
    pub(crate) deterministic_iv: bool,
}

impl CryptoPolicy {
    /// Policy with production defaults: 10k PBKDF2 rounds, random IVs.
    pub fn new(salt: SecretString) -> Self {
        Self {
            salt,
            iterations: DEFAULT_KDF_ITERATIONS,
            deterministic_iv: false,
        }
    }

    /// Policy driven by the `[crypto]` config section. The salt never
    /// lives in config files, so it is passed in separately.
    pub fn from_config(config: &CryptoConfig, salt: SecretString) -> Self {
        Self {
            salt,
            iterations: config.iterations,
            deterministic_iv: config.deterministic_iv,
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_deterministic_iv(mut self, enabled: bool) -> Self {
        self.deterministic_iv = enabled;
        self
    }
}

/// The upload orchestrator.
///
/// Holds the object gateway, the metadata store, and the crypto policy;
/// cheap to clone and share across tasks.
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) store: Arc<dyn ObjectGateway>,
    pub(crate) meta: Arc<dyn MetadataStore>,
    pub(crate) crypto: CryptoPolicy,
    pub(crate) upload_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ObjectGateway>,
        meta: Arc<dyn MetadataStore>,
        crypto: CryptoPolicy,
    ) -> Self {
        Self {
            store,
            meta,
            crypto,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Bound each object write in a batch. A write that exceeds the bound
    /// fails the whole batch; sensible values are seconds, not minutes.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }
}
