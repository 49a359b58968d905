//! Photo and raw-file uploads.
//!
//! A photo fans out into three objects (original plus 200 and 500 box
//! derivatives) committed as one batch, then exactly one asset row. A raw
//! file is a single object plus its row. In both cases the row is written
//! only after every object landed.

use tokio::task::spawn_blocking;
use tracing::info;

use darkroom_core::{unique_file_name, unique_object_name, AssetKind};
use darkroom_media::{DerivativeSet, DERIVATIVE_CONTENT_TYPE, MEDIUM_BOX, SMALL_BOX};
use darkroom_meta::NewAsset;

use crate::batch::{commit_batch, BatchObject};
use crate::{Pipeline, PipelineError};

/// Stored photos are always JPEG, originals included.
const PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Fallback content type for raw files uploaded without one.
const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// A photo upload request.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub owner_id: String,
    /// Decoded image bytes; run base64 input through
    /// [`decode_base64_payload`](crate::decode_base64_payload) first.
    pub bytes: Vec<u8>,
    /// Client-defined property string stored on the asset row.
    pub property: Option<String>,
}

/// Keys and row id of a committed photo upload.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub object_key: String,
    pub thumbnail_key: String,
    pub preview_key: String,
    pub asset_id: i64,
}

/// A raw-file upload request.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub owner_id: String,
    pub bytes: Vec<u8>,
    /// Original client file name; a generated name is used when absent.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// Key and row id of a committed file upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub object_key: String,
    pub asset_id: i64,
}

impl Pipeline {
    /// Upload a photo: original plus both derivatives in one batch, then
    /// the asset row. An undecodable payload stops the upload before any
    /// object is written.
    pub async fn upload_photo(&self, request: PhotoUpload) -> Result<UploadedPhoto, PipelineError> {
        if request.owner_id.is_empty() {
            return Err(PipelineError::Validation("owner id must not be empty".into()));
        }
        if request.bytes.is_empty() {
            return Err(PipelineError::Validation(
                "image payload must not be empty".into(),
            ));
        }

        let byte_size = request.bytes.len() as u64;
        let (original, derivatives) = render_derivatives(request.bytes).await?;

        let file_name = unique_object_name("jpg");
        let object_key = AssetKind::Photo.object_key(&request.owner_id, &file_name);
        let thumbnail_key = AssetKind::Photo
            .derivative_key(&request.owner_id, SMALL_BOX, &file_name)
            .expect("photo kind carries derivatives");
        let preview_key = AssetKind::Photo
            .derivative_key(&request.owner_id, MEDIUM_BOX, &file_name)
            .expect("photo kind carries derivatives");

        let batch = vec![
            BatchObject::new(object_key.clone(), original, PHOTO_CONTENT_TYPE),
            BatchObject::new(thumbnail_key.clone(), derivatives.small, DERIVATIVE_CONTENT_TYPE),
            BatchObject::new(preview_key.clone(), derivatives.medium, DERIVATIVE_CONTENT_TYPE),
        ];
        commit_batch(&self.store, batch, self.upload_timeout).await?;

        let record = self
            .meta
            .insert_asset(NewAsset {
                owner_id: request.owner_id.clone(),
                kind: AssetKind::Photo,
                file_name,
                byte_size,
                content_type: PHOTO_CONTENT_TYPE.to_string(),
                storage_key: object_key.clone(),
                thumbnail_key: Some(thumbnail_key.clone()),
                property: request.property,
            })
            .await?;

        info!(
            owner = %request.owner_id,
            key = %object_key,
            asset_id = record.id,
            bytes = byte_size,
            "photo upload committed"
        );

        Ok(UploadedPhoto {
            object_key,
            thumbnail_key,
            preview_key,
            asset_id: record.id,
        })
    }

    /// Upload a raw file: one object, no derivatives, then the asset row.
    pub async fn upload_file(&self, request: FileUpload) -> Result<UploadedFile, PipelineError> {
        if request.owner_id.is_empty() {
            return Err(PipelineError::Validation("owner id must not be empty".into()));
        }
        if request.bytes.is_empty() {
            return Err(PipelineError::Validation(
                "file payload must not be empty".into(),
            ));
        }

        let file_name = match request.file_name.as_deref() {
            Some(name) if !name.is_empty() => unique_file_name(name),
            _ => unique_object_name("bin"),
        };
        let content_type = request
            .content_type
            .unwrap_or_else(|| FILE_CONTENT_TYPE.to_string());
        let byte_size = request.bytes.len() as u64;
        let object_key = AssetKind::File.object_key(&request.owner_id, &file_name);

        let batch = vec![BatchObject::new(
            object_key.clone(),
            request.bytes,
            &content_type,
        )];
        commit_batch(&self.store, batch, self.upload_timeout).await?;

        let record = self
            .meta
            .insert_asset(NewAsset {
                owner_id: request.owner_id.clone(),
                kind: AssetKind::File,
                file_name,
                byte_size,
                content_type,
                storage_key: object_key.clone(),
                thumbnail_key: None,
                property: None,
            })
            .await?;

        info!(
            owner = %request.owner_id,
            key = %object_key,
            asset_id = record.id,
            "file upload committed"
        );

        Ok(UploadedFile {
            object_key,
            asset_id: record.id,
        })
    }
}

/// Decode and resize on the blocking pool, handing the original bytes back
/// out alongside the derivative set.
pub(crate) async fn render_derivatives(
    original: Vec<u8>,
) -> Result<(Vec<u8>, DerivativeSet), PipelineError> {
    let (original, derivatives) = spawn_blocking(move || {
        let derivatives = darkroom_media::generate(&original);
        (original, derivatives)
    })
    .await
    .expect("derivative generation task panicked");
    Ok((original, derivatives?))
}
