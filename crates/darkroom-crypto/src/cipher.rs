//! AES-256-CBC document encryption/decryption with PKCS#7 padding
//!
//! Ciphertext layout is bare CBC output: no header, no embedded IV, no MAC.
//! The IV travels in the object's envelope (see [`crate::envelope`]), and the
//! padding check is the only integrity signal — a wrong key, wrong IV, or
//! corrupted ciphertext is reported as a padding failure, not distinguished
//! further. I/O problems never surface here; they belong to the storage layer.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

use crate::kdf::DocumentKey;
use crate::{BLOCK_SIZE, IV_SIZE};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The ciphertext is structurally malformed: valid CBC output is always
    /// one or more whole blocks.
    #[error("ciphertext length {0} is not a positive multiple of the {BLOCK_SIZE}-byte AES block")]
    Misaligned(usize),

    /// The padding check failed after block decryption: wrong key, wrong IV,
    /// or corrupted ciphertext.
    #[error("padding check failed: wrong key/IV or corrupted ciphertext")]
    Padding,
}

/// Encrypt a document with AES-256-CBC and PKCS#7 padding.
///
/// Output length is `plaintext.len()` rounded up to the next block boundary;
/// an empty plaintext still produces one full padding block.
pub fn encrypt(plaintext: &[u8], key: &DocumentKey, iv: &[u8; IV_SIZE]) -> Vec<u8> {
    Aes256CbcEnc::new(key.as_bytes().into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt a document produced by [`encrypt`], stripping the PKCS#7 padding.
pub fn decrypt(
    ciphertext: &[u8],
    key: &DocumentKey,
    iv: &[u8; IV_SIZE],
) -> Result<Vec<u8>, CipherError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::Misaligned(ciphertext.len()));
    }

    Aes256CbcDec::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::Padding)
}
