//! Stickerforge Core Library
//!
//! Pure value types shared across the stickerforge workspace: output canvas
//! geometry, frame sampling schedules, conversion options and the
//! size-budget compression ladder. This crate performs no I/O.

pub mod ladder;
pub mod layout;
pub mod options;
pub mod schedule;

pub use ladder::{default_ladder, CompressionStep, DEFAULT_BUDGET_BYTES};
pub use layout::{parse_color, Color, CropRegion, FitMode, FrameLayout};
pub use options::GifOptions;
pub use schedule::{SampleSchedule, SampleSpan};

/// Result type for stickerforge-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for stickerforge-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid color literal '{0}' (expected 'transparent', #rgb, #rrggbb or #rrggbbaa)")]
    InvalidColor(String),

    #[error("frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f64),

    #[error("source duration must be finite and positive, got {0}")]
    InvalidDuration(f64),
}
