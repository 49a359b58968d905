pub mod config;
pub mod types;

pub use config::DarkroomConfig;
pub use types::{document_key, unique_file_name, unique_object_name, AssetKind};
