//! Stickerforge Compose Library
//!
//! Deterministic pixel compositing onto fixed-size RGBA canvases: stretch,
//! letterboxed contain, and crop-to-target resampling, plus the still-image
//! (PNG/JPEG) entry points used by the sticker image modules.

pub mod compositor;
pub mod still;

pub use compositor::{compose, compose_crop};
pub use still::{crop_still, encode_still, resize_still, StillFormat};

/// Result type for stickerforge-compose operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for stickerforge-compose operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not acquire a {0}x{1} output surface")]
    Surface(u32, u32),

    #[error("crop region is empty or outside the source bounds")]
    EmptyRegion,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
