//! Key derivation: PBKDF2-HMAC-SHA256 over project scope ids
//!
//! The scope id (project/album identifier) is the PBKDF2 password and the
//! process-wide secret salt is the PBKDF2 salt. The roles are inverted from
//! the usual passphrase setup: the scope id is public, so the derivation is
//! only as strong as the salt's entropy. The salt enters the process through
//! configuration as a [`SecretString`] and must never be persisted or logged.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{IV_SIZE, KEY_SIZE};

/// A 256-bit AES document key derived from a scope id.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone, PartialEq)]
pub struct DocumentKey {
    bytes: [u8; KEY_SIZE],
}

impl DocumentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DocumentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive key material of an arbitrary length for a scope.
///
/// The typed wrappers below cover the two lengths the pipeline uses; this
/// stays public for callers that need other lengths. The caller owns
/// zeroization of the returned buffer.
pub fn derive_key_material(
    salt: &SecretString,
    scope_id: &str,
    iterations: u32,
    len: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; len];
    fill_material(salt, scope_id, iterations, &mut out);
    out
}

/// Derive the 256-bit document key for a scope.
pub fn derive_document_key(salt: &SecretString, scope_id: &str, iterations: u32) -> DocumentKey {
    let mut bytes = [0u8; KEY_SIZE];
    fill_material(salt, scope_id, iterations, &mut bytes);
    DocumentKey::from_bytes(bytes)
}

/// Derive the legacy 16-byte IV for a scope.
///
/// PBKDF2 output at a shorter length is a prefix of the output at a longer
/// length, so this IV is exactly the first half of the document key — and it
/// is the same for every write to the scope, which leaks plaintext-prefix
/// equality across writes. New writes use [`random_iv`] and carry the IV in
/// the envelope; this derivation exists only to write documents readable by
/// deployments still on the derived-IV layout.
pub fn derive_document_iv(salt: &SecretString, scope_id: &str, iterations: u32) -> [u8; IV_SIZE] {
    let mut bytes = [0u8; IV_SIZE];
    fill_material(salt, scope_id, iterations, &mut bytes);
    bytes
}

/// A fresh random IV from the OS RNG.
pub fn random_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

fn fill_material(salt: &SecretString, scope_id: &str, iterations: u32, out: &mut [u8]) {
    pbkdf2_hmac::<Sha256>(
        scope_id.as_bytes(),
        salt.expose_secret().as_bytes(),
        iterations,
        out,
    );
}
