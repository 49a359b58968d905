use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration (loaded from darkroom.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DarkroomConfig {
    pub storage: StorageConfig,
    pub crypto: CryptoConfig,
    pub pipeline: PipelineConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// S3-compatible endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket holding all asset objects
    pub bucket: String,
    /// Enforce HTTPS for S3 connections (warn/error on HTTP endpoints)
    pub enforce_tls: bool,
}

/// Document encryption configuration.
///
/// The KDF salt is deliberately absent here: it is a process secret and only
/// enters through the `DARKROOM_KDF_SALT` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 iteration count (default: 10000)
    pub iterations: u32,
    /// Derive the IV from the scope id instead of generating a random one.
    ///
    /// Only for writing documents readable by deployments that still derive
    /// IVs; new deployments should leave this off. Reads work either way
    /// because the IV always travels in the object's envelope.
    pub deterministic_iv: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-object upload timeout within a batch, in seconds (default: 30)
    pub upload_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// JSON metadata store path
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            bucket: "darkroom".into(),
            enforce_tls: false,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            deterministic_iv: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upload_timeout_secs: 30,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("~/.local/share/darkroom/metadata.json"),
        }
    }
}
