//! Key/IV envelope persisted in object user metadata
//!
//! Every encrypted document object carries its own decryption envelope as two
//! string fields in the store's user-metadata map:
//!
//! ```text
//! enc-key = hex(32-byte AES key)
//! enc-iv  = hex(16-byte CBC IV)
//! ```
//!
//! This makes a document self-contained — fetch the object, read the two
//! fields, decrypt. Missing or malformed fields are envelope errors, distinct
//! from decrypt failures: an envelope error means the object was written by
//! something other than this pipeline (or the metadata was stripped), while a
//! padding failure means the envelope was intact but the bytes were not.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::kdf::DocumentKey;
use crate::{IV_SIZE, KEY_SIZE};

/// Metadata field holding the hex key.
pub const KEY_FIELD: &str = "enc-key";
/// Metadata field holding the hex IV.
pub const IV_FIELD: &str = "enc-iv";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("object metadata is missing the {0} field")]
    MissingField(&'static str),

    #[error("{0} field is not valid hex")]
    InvalidHex(&'static str),

    #[error("{field} decodes to {actual} bytes, expected {expected}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// The key/IV pair for one document, in the hex form it is persisted in.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    key_hex: String,
    iv_hex: String,
}

impl Envelope {
    pub fn new(key: &DocumentKey, iv: &[u8; IV_SIZE]) -> Self {
        Self {
            key_hex: hex::encode(key.as_bytes()),
            iv_hex: hex::encode(iv),
        }
    }

    /// Read the envelope out of an object's user-metadata map.
    ///
    /// Presence only; hex and length problems surface from [`Envelope::key`]
    /// and [`Envelope::iv`].
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self, EnvelopeError> {
        let key_hex = metadata
            .get(KEY_FIELD)
            .ok_or(EnvelopeError::MissingField(KEY_FIELD))?
            .clone();
        let iv_hex = metadata
            .get(IV_FIELD)
            .ok_or(EnvelopeError::MissingField(IV_FIELD))?
            .clone();
        Ok(Self { key_hex, iv_hex })
    }

    /// The user-metadata map to attach when writing the document object.
    pub fn to_metadata(&self) -> HashMap<String, String> {
        HashMap::from([
            (KEY_FIELD.to_string(), self.key_hex.clone()),
            (IV_FIELD.to_string(), self.iv_hex.clone()),
        ])
    }

    pub fn key(&self) -> Result<DocumentKey, EnvelopeError> {
        let bytes = decode_fixed::<KEY_SIZE>(KEY_FIELD, &self.key_hex)?;
        Ok(DocumentKey::from_bytes(bytes))
    }

    pub fn iv(&self) -> Result<[u8; IV_SIZE], EnvelopeError> {
        decode_fixed::<IV_SIZE>(IV_FIELD, &self.iv_hex)
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("key_hex", &"[REDACTED]")
            .field("iv_hex", &self.iv_hex)
            .finish()
    }
}

fn decode_fixed<const N: usize>(
    field: &'static str,
    hex_str: &str,
) -> Result<[u8; N], EnvelopeError> {
    let bytes = hex::decode(hex_str).map_err(|_| EnvelopeError::InvalidHex(field))?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| EnvelopeError::WrongLength {
            field,
            expected: N,
            actual,
        })
}
