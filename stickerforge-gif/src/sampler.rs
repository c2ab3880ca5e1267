//! Sequential frame sampling: seek, capture, composite

use crate::encoder::GifEncoder;
use crate::source::FrameSource;
use crate::Result;
use stickerforge_compose::compose;
use stickerforge_core::{FrameLayout, SampleSchedule};

/// Share of overall progress given to the capture phase; encoding owns the
/// rest. Fixed split: per-frame seeks dominate wall time on most inputs.
pub const CAPTURE_SHARE: f64 = 0.5;

/// Drives a frame source through a sample schedule, compositing each
/// captured frame onto the attempt's canvas and queueing it for encoding.
///
/// Capture is strictly sequential: frame `i + 1` is not requested until
/// frame `i` has been captured and composited, because the source owns a
/// single decode cursor.
pub struct FrameSampler<'a, S: FrameSource> {
    source: &'a mut S,
    layout: FrameLayout,
    schedule: SampleSchedule,
}

impl<'a, S: FrameSource> FrameSampler<'a, S> {
    /// Creates a sampler for one conversion attempt.
    pub fn new(source: &'a mut S, layout: FrameLayout, schedule: SampleSchedule) -> Self {
        Self {
            source,
            layout,
            schedule,
        }
    }

    /// Captures every scheduled frame into `encoder`, reporting progress in
    /// `[0, CAPTURE_SHARE]`.
    pub fn run(mut self, encoder: &mut GifEncoder, on_progress: &mut dyn FnMut(f64)) -> Result<()> {
        let total = self.schedule.frame_count();
        let delay_ms = self.schedule.delay_ms();

        for (index, &time_sec) in self.schedule.times().iter().enumerate() {
            let frame = self.source.capture(time_sec)?;
            let composed = compose(&frame, &self.layout)?;
            encoder.add_frame(composed, delay_ms)?;
            log::trace!("captured frame {}/{} at {:.3}s", index + 1, total, time_sec);
            on_progress((index + 1) as f64 / total as f64 * CAPTURE_SHARE);
        }

        Ok(())
    }
}
