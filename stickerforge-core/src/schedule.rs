//! Frame sampling schedules for video conversion

use crate::{Error, Result};

/// Margin keeping every timestamp strictly before end-of-media, in seconds.
const END_GUARD_SEC: f64 = 0.001;

/// Which part of the source duration capture timestamps are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SampleSpan {
    /// Sample only the leading `target_duration_sec` of the source.
    #[default]
    First,
    /// Spread samples across the whole source duration, time-compressing it
    /// into the output duration.
    Full,
}

/// An ordered list of capture timestamps plus the per-frame display delay.
///
/// Timestamps are monotonically non-decreasing and every one is strictly
/// less than the source duration. Rebuilt fresh for each conversion attempt.
#[derive(Debug, Clone)]
pub struct SampleSchedule {
    times: Vec<f64>,
    delay_ms: f64,
}

impl SampleSchedule {
    /// Builds the capture schedule for one conversion attempt.
    ///
    /// The frame count is `max(1, floor(output_duration * fps))` where
    /// `output_duration = min(target_duration_sec, duration_sec)`; the
    /// degenerate single-frame case captures at t = 0.
    pub fn build(
        fps: f64,
        target_duration_sec: Option<f64>,
        span: SampleSpan,
        duration_sec: f64,
    ) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(Error::InvalidFrameRate(fps));
        }
        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return Err(Error::InvalidDuration(duration_sec));
        }

        let output_duration = target_duration_sec
            .unwrap_or(duration_sec)
            .min(duration_sec);
        let sample_duration = match span {
            SampleSpan::First => output_duration,
            SampleSpan::Full => duration_sec,
        };

        let total = ((output_duration * fps).floor() as usize).max(1);
        let safe_end = (duration_sec - END_GUARD_SEC).max(0.0);
        let times = (0..total)
            .map(|i| {
                let alpha = if total == 1 {
                    0.0
                } else {
                    i as f64 / (total - 1) as f64
                };
                (alpha * sample_duration).min(safe_end)
            })
            .collect();

        Ok(Self {
            times,
            delay_ms: 1000.0 / fps,
        })
    }

    /// The capture timestamps in seconds, in presentation order.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of frames this schedule captures.
    pub fn frame_count(&self) -> usize {
        self.times.len()
    }

    /// Display delay per frame in milliseconds (`1000 / fps`).
    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_frames_over_three_seconds() {
        // 10s source, 10 fps, 3s target: 30 frames spanning [0, 3), none >= 10
        let schedule = SampleSchedule::build(10.0, Some(3.0), SampleSpan::First, 10.0).unwrap();
        assert_eq!(schedule.frame_count(), 30);
        assert_eq!(schedule.times()[0], 0.0);
        let last = *schedule.times().last().unwrap();
        assert!(last <= 3.0, "last timestamp {last} outside target span");
        assert!(schedule.times().iter().all(|&t| t < 10.0));
    }

    #[test]
    fn timestamps_are_monotonic() {
        let schedule = SampleSchedule::build(7.0, Some(2.5), SampleSpan::Full, 8.0).unwrap();
        for pair in schedule.times().windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn full_span_reaches_toward_source_end() {
        let schedule = SampleSchedule::build(5.0, Some(2.0), SampleSpan::Full, 6.0).unwrap();
        assert_eq!(schedule.frame_count(), 10);
        let last = *schedule.times().last().unwrap();
        assert!(last > 5.9 && last < 6.0);
    }

    #[test]
    fn degenerate_input_still_yields_one_frame() {
        // duration * fps rounds to zero frames
        let schedule = SampleSchedule::build(2.0, Some(0.1), SampleSpan::First, 0.1).unwrap();
        assert_eq!(schedule.frame_count(), 1);
        assert_eq!(schedule.times()[0], 0.0);
    }

    #[test]
    fn target_longer_than_source_is_clamped() {
        let schedule = SampleSchedule::build(10.0, Some(60.0), SampleSpan::First, 2.0).unwrap();
        assert_eq!(schedule.frame_count(), 20);
        assert!(schedule.times().iter().all(|&t| t < 2.0));
    }

    #[test]
    fn rejects_bad_fps_and_duration() {
        assert!(SampleSchedule::build(0.0, None, SampleSpan::First, 5.0).is_err());
        assert!(SampleSchedule::build(-1.0, None, SampleSpan::First, 5.0).is_err());
        assert!(SampleSchedule::build(10.0, None, SampleSpan::First, f64::NAN).is_err());
        assert!(SampleSchedule::build(10.0, None, SampleSpan::First, 0.0).is_err());
    }

    #[test]
    fn delay_follows_frame_rate() {
        let schedule = SampleSchedule::build(8.0, Some(1.0), SampleSpan::First, 4.0).unwrap();
        assert_eq!(schedule.delay_ms(), 125.0);
    }
}
