//! Stickerforge GIF Library
//!
//! Frame-accurate video → GIF conversion with an adaptive size-budget
//! search: a frame sampler driving an exclusive decode cursor, a GIF
//! encoder with per-frame palettes, and a controller that walks a
//! compression ladder until the output fits a byte budget.

pub mod encoder;
pub mod progress;
pub mod sampler;
pub mod source;
pub mod transcode;

pub use encoder::GifEncoder;
pub use progress::ProgressPrinter;
pub use sampler::FrameSampler;
pub use source::{FfmpegSource, FrameSource, SourceInfo};
pub use transcode::{convert_video_to_gif, transcode_to_budget};

/// Result type for stickerforge-gif operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for stickerforge-gif operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core error: {0}")]
    Core(#[from] stickerforge_core::Error),

    #[error("Compose error: {0}")]
    Compose(#[from] stickerforge_compose::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("Video load failed: {0}")]
    SourceLoad(String),

    #[error("Video load timed out")]
    SourceLoadTimeout,

    #[error("Video seek failed: {0}")]
    Seek(String),

    #[error("Video seek timed out")]
    SeekTimeout,

    #[error("Video duration unavailable")]
    InvalidSource,

    #[error("No video stream found")]
    NoVideoStream,

    #[error("GIF encode failed: {0}")]
    Encoding(String),

    #[error("Output still larger than the size budget (last attempt ~{} KB)", .last_bytes / 1024)]
    BudgetExceeded {
        /// Byte size of the final attempt's output, for diagnostics
        last_bytes: usize,
    },
}

#[cfg(test)]
pub(crate) mod test_support;
