//! User-facing configuration for video → GIF conversion

use crate::layout::{Color, FitMode, FrameLayout};
use crate::schedule::SampleSpan;

/// Recognized options for one video → GIF conversion.
///
/// Output size resolution: an explicit `width`/`height` wins; otherwise a
/// `max_width`/`max_height` bound scales the source down (never up);
/// otherwise the source size is used as-is.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GifOptions {
    /// Explicit output width
    pub width: Option<u32>,
    /// Explicit output height
    pub height: Option<u32>,
    /// Width bound applied when no explicit size is given
    pub max_width: Option<u32>,
    /// Height bound applied when no explicit size is given
    pub max_height: Option<u32>,
    /// Source-to-canvas mapping
    pub fit: FitMode,
    /// Capture frame rate
    pub fps: f64,
    /// Output clip length in seconds; `None` keeps the source duration
    pub target_duration_sec: Option<f64>,
    /// Which part of the source the frames are drawn from
    pub sample_span: SampleSpan,
    /// Quantizer sampling interval, 1–30; lower is higher fidelity and
    /// larger output
    pub quality: u8,
    /// Palette-quantization worker threads used while encoding
    pub workers: usize,
    /// Padding color for `Contain`
    pub fill: Option<Color>,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            max_width: None,
            max_height: None,
            fit: FitMode::Stretch,
            fps: 10.0,
            target_duration_sec: None,
            sample_span: SampleSpan::First,
            quality: 10,
            workers: 2,
            fill: None,
        }
    }
}

impl GifOptions {
    /// Resolves the output canvas size for a source of the given dimensions.
    pub fn resolve_output_size(&self, src_width: u32, src_height: u32) -> (u32, u32) {
        if self.width.is_some() || self.height.is_some() {
            return (
                self.width.unwrap_or(src_width),
                self.height.unwrap_or(src_height),
            );
        }

        if self.max_width.is_some() || self.max_height.is_some() {
            let max_w = self.max_width.map_or(f64::INFINITY, f64::from);
            let max_h = self.max_height.map_or(f64::INFINITY, f64::from);
            let scale = (max_w / f64::from(src_width.max(1)))
                .min(max_h / f64::from(src_height.max(1)))
                .min(1.0);
            return (
                ((f64::from(src_width) * scale).round() as u32).max(1),
                ((f64::from(src_height) * scale).round() as u32).max(1),
            );
        }

        (src_width, src_height)
    }

    /// The output surface description for a source of the given dimensions.
    pub fn layout_for(&self, src_width: u32, src_height: u32) -> FrameLayout {
        let (width, height) = self.resolve_output_size(src_width, src_height);
        FrameLayout {
            width,
            height,
            fit: self.fit,
            fill: self.fill,
        }
    }
}
