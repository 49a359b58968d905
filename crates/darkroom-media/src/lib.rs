//! darkroom-media: photo derivative generation
//!
//! Every image upload produces the original plus two fit-inside renditions:
//!
//! ```text
//! original (any decodable format)
//!   ├── 200×200 box → JPEG thumbnail rendition
//!   └── 500×500 box → JPEG preview rendition
//! ```
//!
//! Aspect ratio is preserved, images are never upscaled, and output is
//! always JPEG whatever the input format was. Decoding happens once per
//! upload; an undecodable payload fails here before anything touches
//! storage.

pub mod resize;

pub use resize::{fit_dimensions, generate, DerivativeSet, MediaError};

/// Bounding box edge for the thumbnail rendition.
pub const SMALL_BOX: u32 = 200;

/// Bounding box edge for the preview rendition.
pub const MEDIUM_BOX: u32 = 500;

/// Content type of every derivative, regardless of input format.
pub const DERIVATIVE_CONTENT_TYPE: &str = "image/jpeg";
