//! Metadata store implementations
//!
//! Two backends share the same table state:
//!   - **Memory**: plain in-process tables, for tests and scenario assertions.
//!   - **JSON** (default for the CLI): tables persisted to one JSON file,
//!     written through on every mutation via temp+rename. Write-through
//!     matters here: an acknowledged row that could vanish on crash would
//!     break the objects-before-metadata ordering the pipeline promises.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::records::{AssetRecord, NewAsset, TemplateDraft, TemplateRecord};

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("{table} row {id} not found")]
    RowNotFound { table: &'static str, id: i64 },

    #[error("metadata store I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata store serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Capability surface the pipeline needs from the relational side.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Record a committed upload; returns the row with its assigned id.
    async fn insert_asset(&self, draft: NewAsset) -> Result<AssetRecord, MetaError>;

    async fn asset(&self, id: i64) -> Result<Option<AssetRecord>, MetaError>;

    async fn assets_by_owner(&self, owner_id: &str) -> Result<Vec<AssetRecord>, MetaError>;

    /// Create a template row; returns it with its assigned id.
    async fn insert_template(&self, draft: TemplateDraft) -> Result<TemplateRecord, MetaError>;

    /// Replace an existing template row. A missing id is an error — the
    /// caller chose update over insert, so silently creating would hide a
    /// stale id.
    async fn update_template(
        &self,
        id: i64,
        draft: TemplateDraft,
    ) -> Result<TemplateRecord, MetaError>;

    async fn template(&self, id: i64) -> Result<Option<TemplateRecord>, MetaError>;

    async fn templates_by_owner(&self, owner_id: &str) -> Result<Vec<TemplateRecord>, MetaError>;
}

// ── Shared table state ────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    next_asset_id: i64,
    next_template_id: i64,
    assets: BTreeMap<i64, AssetRecord>,
    templates: BTreeMap<i64, TemplateRecord>,
}

impl Tables {
    fn insert_asset(&mut self, draft: NewAsset) -> AssetRecord {
        self.next_asset_id += 1;
        let record = AssetRecord {
            id: self.next_asset_id,
            owner_id: draft.owner_id,
            kind: draft.kind,
            file_name: draft.file_name,
            byte_size: draft.byte_size,
            content_type: draft.content_type,
            storage_key: draft.storage_key,
            thumbnail_key: draft.thumbnail_key,
            property: draft.property,
            created_at: now_secs(),
        };
        self.assets.insert(record.id, record.clone());
        record
    }

    fn insert_template(&mut self, draft: TemplateDraft) -> TemplateRecord {
        self.next_template_id += 1;
        let record = TemplateRecord {
            id: self.next_template_id,
            owner_id: draft.owner_id,
            content: draft.content,
            product_code: draft.product_code,
            group_code: draft.group_code,
            theme_code: draft.theme_code,
            tags: draft.tags,
            image_key: draft.image_key,
            updated_at: now_secs(),
        };
        self.templates.insert(record.id, record.clone());
        record
    }

    fn update_template(&mut self, id: i64, draft: TemplateDraft) -> Result<TemplateRecord, MetaError> {
        let row = self.templates.get_mut(&id).ok_or(MetaError::RowNotFound {
            table: "templates",
            id,
        })?;
        row.owner_id = draft.owner_id;
        row.content = draft.content;
        row.product_code = draft.product_code;
        row.group_code = draft.group_code;
        row.theme_code = draft.theme_code;
        row.tags = draft.tags;
        row.image_key = draft.image_key;
        row.updated_at = now_secs();
        Ok(row.clone())
    }

    fn assets_by_owner(&self, owner_id: &str) -> Vec<AssetRecord> {
        self.assets
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect()
    }

    fn templates_by_owner(&self, owner_id: &str) -> Vec<TemplateRecord> {
        self.templates
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// Tables held purely in process memory. Rows vanish with the process.
#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn asset_count(&self) -> usize {
        self.tables.lock().await.assets.len()
    }

    pub async fn template_count(&self) -> usize {
        self.tables.lock().await.templates.len()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert_asset(&self, draft: NewAsset) -> Result<AssetRecord, MetaError> {
        Ok(self.tables.lock().await.insert_asset(draft))
    }

    async fn asset(&self, id: i64) -> Result<Option<AssetRecord>, MetaError> {
        Ok(self.tables.lock().await.assets.get(&id).cloned())
    }

    async fn assets_by_owner(&self, owner_id: &str) -> Result<Vec<AssetRecord>, MetaError> {
        Ok(self.tables.lock().await.assets_by_owner(owner_id))
    }

    async fn insert_template(&self, draft: TemplateDraft) -> Result<TemplateRecord, MetaError> {
        Ok(self.tables.lock().await.insert_template(draft))
    }

    async fn update_template(
        &self,
        id: i64,
        draft: TemplateDraft,
    ) -> Result<TemplateRecord, MetaError> {
        self.tables.lock().await.update_template(id, draft)
    }

    async fn template(&self, id: i64) -> Result<Option<TemplateRecord>, MetaError> {
        Ok(self.tables.lock().await.templates.get(&id).cloned())
    }

    async fn templates_by_owner(&self, owner_id: &str) -> Result<Vec<TemplateRecord>, MetaError> {
        Ok(self.tables.lock().await.templates_by_owner(owner_id))
    }
}

// ── JSON file store ───────────────────────────────────────────────────────────

/// Tables persisted to a single JSON file.
///
/// Loads entirely into memory on open; every mutation rewrites the file
/// atomically (write temp, then rename).
#[derive(Clone, Debug)]
pub struct JsonMetadataStore {
    path: PathBuf,
    tables: Arc<Mutex<Tables>>,
}

impl JsonMetadataStore {
    /// Load or create a store at the given path. A missing file starts
    /// empty; a malformed one is an error rather than silent data loss.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, MetaError> {
        let path = path.into();
        let tables = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            tables: Arc::new(Mutex::new(tables)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, tables: &Tables) -> Result<(), MetaError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(tables)?;
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        debug!(path = %self.path.display(), "persisted metadata tables");
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for JsonMetadataStore {
    async fn insert_asset(&self, draft: NewAsset) -> Result<AssetRecord, MetaError> {
        let mut tables = self.tables.lock().await;
        let record = tables.insert_asset(draft);
        self.persist(&tables).await?;
        Ok(record)
    }

    async fn asset(&self, id: i64) -> Result<Option<AssetRecord>, MetaError> {
        Ok(self.tables.lock().await.assets.get(&id).cloned())
    }

    async fn assets_by_owner(&self, owner_id: &str) -> Result<Vec<AssetRecord>, MetaError> {
        Ok(self.tables.lock().await.assets_by_owner(owner_id))
    }

    async fn insert_template(&self, draft: TemplateDraft) -> Result<TemplateRecord, MetaError> {
        let mut tables = self.tables.lock().await;
        let record = tables.insert_template(draft);
        self.persist(&tables).await?;
        Ok(record)
    }

    async fn update_template(
        &self,
        id: i64,
        draft: TemplateDraft,
    ) -> Result<TemplateRecord, MetaError> {
        let mut tables = self.tables.lock().await;
        let record = tables.update_template(id, draft)?;
        self.persist(&tables).await?;
        Ok(record)
    }

    async fn template(&self, id: i64) -> Result<Option<TemplateRecord>, MetaError> {
        Ok(self.tables.lock().await.templates.get(&id).cloned())
    }

    async fn templates_by_owner(&self, owner_id: &str) -> Result<Vec<TemplateRecord>, MetaError> {
        Ok(self.tables.lock().await.templates_by_owner(owner_id))
    }
}
