use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// What an uploaded asset is, which decides its key layout, its derivative
/// policy, and how it is recorded in the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// User photo: original plus 200/500 derivatives under the photos prefix.
    Photo,
    /// Encrypted project document: a single scope-addressed object.
    Album,
    /// Raw file attachment: a single object, no derivatives.
    File,
    /// Design template image: original plus 200/500 derivatives under the
    /// templates prefix.
    Template,
}

impl AssetKind {
    /// Storage key for the primary object of this kind.
    ///
    /// Album documents are singleton objects keyed by scope, so `file_name`
    /// does not participate in their key.
    pub fn object_key(self, owner_id: &str, file_name: &str) -> String {
        match self {
            AssetKind::Photo => format!("public/users/photos/{owner_id}/{file_name}"),
            AssetKind::Album => document_key(owner_id),
            AssetKind::File => format!("public/users/files/{owner_id}/{file_name}"),
            AssetKind::Template => format!("public/templates/{owner_id}/{file_name}"),
        }
    }

    /// Storage key for a resized derivative, or `None` for kinds that never
    /// carry derivatives. `box_px` is the bounding-box edge (200 or 500) and
    /// becomes a path segment between the owner and the file name.
    pub fn derivative_key(self, owner_id: &str, box_px: u32, file_name: &str) -> Option<String> {
        match self {
            AssetKind::Photo => Some(format!(
                "public/users/photos/{owner_id}/{box_px}/{file_name}"
            )),
            AssetKind::Template => Some(format!("public/templates/{owner_id}/{box_px}/{file_name}")),
            AssetKind::Album | AssetKind::File => None,
        }
    }

    pub fn has_derivatives(self) -> bool {
        matches!(self, AssetKind::Photo | AssetKind::Template)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetKind::Photo => "photo",
            AssetKind::Album => "album",
            AssetKind::File => "file",
            AssetKind::Template => "template",
        };
        f.write_str(s)
    }
}

/// Storage key of the encrypted document for a project scope.
pub fn document_key(scope_id: &str) -> String {
    format!("public/users/album/{scope_id}_data.json")
}

/// Generated object name: unix millis plus a short random suffix, with the
/// given extension. Collision-safe enough for per-owner prefixes.
pub fn unique_object_name(extension: &str) -> String {
    format!("{}-{}.{extension}", unix_millis(), short_suffix())
}

/// Caller-supplied names keep their original form but get a timestamp prefix
/// so repeated uploads of the same file never overwrite each other.
pub fn unique_file_name(original: &str) -> String {
    format!("{}-{original}", unix_millis())
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn short_suffix() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_keys_follow_layout() {
        let key = AssetKind::Photo.object_key("u1", "17.jpg");
        assert_eq!(key, "public/users/photos/u1/17.jpg");

        let small = AssetKind::Photo.derivative_key("u1", 200, "17.jpg").unwrap();
        assert_eq!(small, "public/users/photos/u1/200/17.jpg");

        let medium = AssetKind::Photo.derivative_key("u1", 500, "17.jpg").unwrap();
        assert_eq!(medium, "public/users/photos/u1/500/17.jpg");
    }

    #[test]
    fn test_template_keys_follow_layout() {
        assert_eq!(
            AssetKind::Template.object_key("u2", "t.jpg"),
            "public/templates/u2/t.jpg"
        );
        assert_eq!(
            AssetKind::Template.derivative_key("u2", 200, "t.jpg").unwrap(),
            "public/templates/u2/200/t.jpg"
        );
    }

    #[test]
    fn test_album_key_is_scope_addressed() {
        assert_eq!(
            AssetKind::Album.object_key("proj42", "ignored"),
            "public/users/album/proj42_data.json"
        );
        assert_eq!(document_key("proj42"), "public/users/album/proj42_data.json");
    }

    #[test]
    fn test_only_image_kinds_have_derivatives() {
        assert!(AssetKind::Photo.has_derivatives());
        assert!(AssetKind::Template.has_derivatives());
        assert!(!AssetKind::Album.has_derivatives());
        assert!(!AssetKind::File.has_derivatives());
        assert!(AssetKind::File.derivative_key("u", 200, "f").is_none());
    }

    #[test]
    fn test_generated_names_are_unique() {
        let a = unique_object_name("jpg");
        let b = unique_object_name("jpg");
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn test_caller_names_keep_original_suffix() {
        let name = unique_file_name("report.pdf");
        assert!(name.ends_with("-report.pdf"));
    }

    #[test]
    fn test_kind_serde_uses_lowercase() {
        let json = serde_json::to_string(&AssetKind::Photo).unwrap();
        assert_eq!(json, "\"photo\"");
        let kind: AssetKind = serde_json::from_str("\"template\"").unwrap();
        assert_eq!(kind, AssetKind::Template);
    }
}
