//! Transport payload decoding.
//!
//! Clients hand image bytes over either raw or as base64 text, and the
//! base64 form often arrives as a full data URL
//! (`data:image/png;base64,...`). Accept both shapes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::PipelineError;

/// Decode a base64 payload, tolerating a data-URL prefix and surrounding
/// whitespace.
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, PipelineError> {
    let trimmed = payload.trim();
    let encoded = match trimmed.split_once("base64,") {
        Some((_, rest)) => rest,
        None => trimmed,
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| PipelineError::Validation(format!("payload is not valid base64: {e}")))
}

// ─────────────────────────────── Tests ───────────────────────────────
