//! The size-budget compression ladder

use crate::layout::{Color, FitMode};
use crate::options::GifOptions;
use crate::schedule::SampleSpan;

/// Default output size budget for sticker GIFs (500 KB).
pub const DEFAULT_BUDGET_BYTES: usize = 500 * 1024;

/// One rung of the compression ladder: a complete parameter set for a single
/// conversion attempt. Successive rungs trade quality for size.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressionStep {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Source-to-canvas mapping
    pub fit: FitMode,
    /// Capture frame rate
    pub fps: f64,
    /// Quantizer sampling interval, 1–30 (lower is better)
    pub quality: u8,
    /// Output clip length in seconds
    pub target_duration_sec: f64,
    /// Which part of the source the frames are drawn from
    pub sample_span: SampleSpan,
}

impl CompressionStep {
    /// Expands this rung into full conversion options.
    pub fn to_options(self, workers: usize, fill: Option<Color>) -> GifOptions {
        GifOptions {
            width: Some(self.width),
            height: Some(self.height),
            max_width: None,
            max_height: None,
            fit: self.fit,
            fps: self.fps,
            target_duration_sec: Some(self.target_duration_sec),
            sample_span: self.sample_span,
            quality: self.quality,
            workers,
            fill,
        }
    }
}

/// The built-in ladder for 240×240 sticker GIFs.
///
/// Frame rate drops and the quantizer coarsens rung by rung; the final rung
/// also shortens the clip. Each rung is no more expensive than the previous
/// one, so the first rung that fits the budget is also the best-looking one.
pub fn default_ladder() -> Vec<CompressionStep> {
    fn rung(fps: f64, quality: u8, target_duration_sec: f64) -> CompressionStep {
        CompressionStep {
            width: 240,
            height: 240,
            fit: FitMode::Contain,
            fps,
            quality,
            target_duration_sec,
            sample_span: SampleSpan::First,
        }
    }

    vec![
        rung(10.0, 12, 3.0),
        rung(8.0, 15, 3.0),
        rung(6.0, 18, 3.0),
        rung(5.0, 22, 3.0),
        rung(4.0, 26, 3.0),
        rung(3.0, 30, 3.0),
        rung(3.0, 30, 2.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_grows_strictly_more_aggressive() {
        let ladder = default_ladder();
        assert_eq!(ladder.len(), 7);
        for pair in ladder.windows(2) {
            assert!(pair[1].fps <= pair[0].fps);
            assert!(pair[1].quality >= pair[0].quality);
            assert!(pair[1].target_duration_sec <= pair[0].target_duration_sec);
        }
    }

    #[test]
    fn ladder_keeps_canvas_fixed() {
        for rung in default_ladder() {
            assert_eq!((rung.width, rung.height), (240, 240));
            assert_eq!(rung.fit, FitMode::Contain);
            assert_eq!(rung.sample_span, SampleSpan::First);
        }
    }

    #[test]
    fn rung_expands_to_explicit_options() {
        let rung = default_ladder()[0];
        let options = rung.to_options(4, None);
        assert_eq!(options.width, Some(240));
        assert_eq!(options.height, Some(240));
        assert_eq!(options.fps, 10.0);
        assert_eq!(options.quality, 12);
        assert_eq!(options.target_duration_sec, Some(3.0));
        assert_eq!(options.workers, 4);
    }
}
