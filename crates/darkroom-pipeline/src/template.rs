//! Template saves: rendered image objects plus a catalog row upsert.
//!
//! The rendered template image gets the same three-object treatment as a
//! photo. The row side is an upsert: a positive template id updates that
//! row in place, anything else inserts a fresh one.

use tracing::info;

use darkroom_core::{unique_object_name, AssetKind};
use darkroom_media::{DERIVATIVE_CONTENT_TYPE, MEDIUM_BOX, SMALL_BOX};
use darkroom_meta::TemplateDraft;

use crate::batch::{commit_batch, BatchObject};
use crate::upload::render_derivatives;
use crate::{Pipeline, PipelineError};

const TEMPLATE_CONTENT_TYPE: &str = "image/jpeg";

/// A template save request. `template_id` selects upsert behavior: a
/// positive id updates that row, anything else inserts a new one.
#[derive(Debug, Clone)]
pub struct TemplateSave {
    pub template_id: Option<i64>,
    pub owner_id: String,
    /// Template body, stored on the row as-is.
    pub content: String,
    pub product_code: String,
    pub group_code: String,
    pub theme_code: String,
    pub tags: Option<String>,
    /// Rendered template image bytes.
    pub image: Vec<u8>,
}

/// Row id and object keys of a committed template save.
#[derive(Debug, Clone)]
pub struct SavedTemplate {
    pub template_id: i64,
    pub object_key: String,
    pub thumbnail_key: String,
}

impl Pipeline {
    /// Commit the template image batch, then upsert the catalog row.
    pub async fn save_template(&self, request: TemplateSave) -> Result<SavedTemplate, PipelineError> {
        if request.owner_id.is_empty() {
            return Err(PipelineError::Validation("owner id must not be empty".into()));
        }
        if request.image.is_empty() {
            return Err(PipelineError::Validation(
                "template image must not be empty".into(),
            ));
        }

        let (image, derivatives) = render_derivatives(request.image).await?;

        let file_name = unique_object_name("jpg");
        let object_key = AssetKind::Template.object_key(&request.owner_id, &file_name);
        let thumbnail_key = AssetKind::Template
            .derivative_key(&request.owner_id, SMALL_BOX, &file_name)
            .expect("template kind carries derivatives");
        let preview_key = AssetKind::Template
            .derivative_key(&request.owner_id, MEDIUM_BOX, &file_name)
            .expect("template kind carries derivatives");

        let batch = vec![
            BatchObject::new(object_key.clone(), image, TEMPLATE_CONTENT_TYPE),
            BatchObject::new(thumbnail_key.clone(), derivatives.small, DERIVATIVE_CONTENT_TYPE),
            BatchObject::new(preview_key, derivatives.medium, DERIVATIVE_CONTENT_TYPE),
        ];
        commit_batch(&self.store, batch, self.upload_timeout).await?;

        let draft = TemplateDraft {
            owner_id: request.owner_id.clone(),
            content: request.content,
            product_code: request.product_code,
            group_code: request.group_code,
            theme_code: request.theme_code,
            tags: request.tags,
            image_key: object_key.clone(),
        };

        let record = match request.template_id {
            Some(id) if id > 0 => self.meta.update_template(id, draft).await?,
            _ => self.meta.insert_template(draft).await?,
        };

        info!(
            owner = %record.owner_id,
            template_id = record.id,
            key = %object_key,
            "template saved"
        );

        Ok(SavedTemplate {
            template_id: record.id,
            object_key,
            thumbnail_key,
        })
    }
}
