//! Shared helpers for unit tests

use crate::source::{FrameSource, SourceInfo};
use crate::Result;
use image::{ImageBuffer, RgbaImage};

/// Deterministic high-entropy frame so encoded sizes track frame counts.
pub(crate) fn patterned_frame(width: u32, height: u32, seed: u64) -> RgbaImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        // xorshift over pixel position and seed
        let mut v = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(u64::from(x) << 32 | u64::from(y));
        v ^= v << 13;
        v ^= v >> 7;
        v ^= v << 17;
        image::Rgba([v as u8, (v >> 8) as u8, (v >> 16) as u8, 255])
    })
}

/// In-memory stand-in for the ffmpeg source: solid decode state, recorded
/// capture timestamps, deterministic frame content.
pub(crate) struct SyntheticSource {
    info: SourceInfo,
    pub captures: Vec<f64>,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, duration_sec: f64) -> Self {
        Self {
            info: SourceInfo {
                width,
                height,
                duration_sec,
            },
            captures: Vec::new(),
        }
    }
}

impl FrameSource for SyntheticSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn capture(&mut self, time_sec: f64) -> Result<RgbaImage> {
        self.captures.push(time_sec);
        let seed = (time_sec * 1000.0).round() as u64;
        Ok(patterned_frame(self.info.width, self.info.height, seed))
    }
}
