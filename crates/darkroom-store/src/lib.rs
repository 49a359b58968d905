//! darkroom-store: object-store gateway over OpenDAL
//!
//! One write, one read, no policy: the gateway performs a single attempt per
//! call and leaves retries, rollback, and ordering to the pipeline. Objects
//! carry a content type and an optional string-map of user metadata — the
//! document-encryption envelope travels in that map.

pub mod gateway;
pub mod health;
pub mod operator;

pub use gateway::{MemoryStore, ObjectGateway, ObjectStore, StoreError, StoredObject};
pub use health::{check_health, is_healthy};
pub use operator::{build_from_config, build_operator, OperatorConfig};
