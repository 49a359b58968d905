//! darkroom-crypto: document encryption for project scopes
//!
//! Pipeline: JSON document → serialize → AES-256-CBC (PKCS#7) → ciphertext object,
//! with the key/IV envelope hex-encoded into the object's user metadata.
//!
//! Keys are never stored in a registry. The 256-bit document key is
//! re-derivable at any time as
//! PBKDF2-HMAC-SHA256(password = scope id, salt = process secret, 10k rounds),
//! and the envelope written onto each object makes every document
//! self-contained: object bytes + object metadata are sufficient to decrypt.

pub mod cipher;
pub mod envelope;
pub mod kdf;

pub use cipher::{decrypt, encrypt, CipherError};
pub use envelope::{Envelope, EnvelopeError};
pub use kdf::{
    derive_document_iv, derive_document_key, derive_key_material, random_iv, DocumentKey,
};

/// Size of a document key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Size of a CBC initialization vector in bytes (one AES block)
pub const IV_SIZE: usize = 16;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Default PBKDF2 iteration count
pub const DEFAULT_KDF_ITERATIONS: u32 = 10_000;
