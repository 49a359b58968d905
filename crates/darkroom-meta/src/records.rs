//! Plain record types for the metadata store
//!
//! Records are inert data: no query methods, no connection handles. All
//! persistence goes through [`crate::MetadataStore`].

use darkroom_core::AssetKind;
use serde::{Deserialize, Serialize};

/// One committed upload: a row written strictly after the object writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: i64,
    pub owner_id: String,
    pub kind: AssetKind,
    /// Object file name (last key segment).
    pub file_name: String,
    /// Size of the original payload in bytes.
    pub byte_size: u64,
    pub content_type: String,
    /// Key of the primary object.
    pub storage_key: String,
    /// Key of the 200-box derivative, for kinds that carry one.
    pub thumbnail_key: Option<String>,
    /// Free-form client-defined property string.
    pub property: Option<String>,
    /// Unix seconds at insert.
    pub created_at: u64,
}

/// Fields the pipeline supplies when recording an upload; id and timestamp
/// are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub owner_id: String,
    pub kind: AssetKind,
    pub file_name: String,
    pub byte_size: u64,
    pub content_type: String,
    pub storage_key: String,
    pub thumbnail_key: Option<String>,
    pub property: Option<String>,
}

/// A design template row: JSON content plus catalog codes and the key of its
/// rendered image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: i64,
    pub owner_id: String,
    /// Template body (JSON string, opaque to the pipeline).
    pub content: String,
    pub product_code: String,
    pub group_code: String,
    pub theme_code: String,
    /// Comma-separated tag list, if any.
    pub tags: Option<String>,
    /// Key of the template's primary image object.
    pub image_key: String,
    /// Unix seconds at last insert/update.
    pub updated_at: u64,
}

/// Fields for creating or updating a template row.
#[derive(Debug, Clone)]
pub struct TemplateDraft {
    pub owner_id: String,
    pub content: String,
    pub product_code: String,
    pub group_code: String,
    pub theme_code: String,
    pub tags: Option<String>,
    pub image_key: String,
}
