//! darkroom-meta: asset and template metadata, behind a capability trait
//!
//! The pipeline records every committed upload as a row; this crate owns the
//! row shapes and the [`MetadataStore`] trait the pipeline writes through.
//! Two implementations ship here: an in-memory store for tests and a JSON
//! file store for single-node CLI use. A relational backend slots in by
//! implementing the same trait.

pub mod records;
pub mod store;

pub use records::{AssetRecord, NewAsset, TemplateDraft, TemplateRecord};
pub use store::{JsonMetadataStore, MemoryMetadataStore, MetaError, MetadataStore};
