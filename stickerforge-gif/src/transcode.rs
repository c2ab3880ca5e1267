//! Adaptive video → GIF transcoding against a byte budget

use crate::encoder::GifEncoder;
use crate::sampler::{FrameSampler, CAPTURE_SHARE};
use crate::source::FrameSource;
use crate::{Error, Result};
use stickerforge_core::{CompressionStep, GifOptions, SampleSchedule};

/// Converts a video source into GIF bytes with explicit options.
///
/// Capture fills the `[0, CAPTURE_SHARE]` portion of the progress range and
/// encoding the remainder; values are monotonically non-decreasing.
pub fn convert_video_to_gif<S: FrameSource>(
    source: &mut S,
    options: &GifOptions,
    on_progress: &mut dyn FnMut(f64),
) -> Result<Vec<u8>> {
    let info = source.info();
    if !info.duration_sec.is_finite() || info.duration_sec <= 0.0 {
        return Err(Error::InvalidSource);
    }

    let layout = options.layout_for(info.width, info.height);
    let schedule = SampleSchedule::build(
        options.fps,
        options.target_duration_sec,
        options.sample_span,
        info.duration_sec,
    )?;
    log::debug!(
        "converting to {}x{}: {} frames, quality {}",
        layout.width,
        layout.height,
        schedule.frame_count(),
        options.quality
    );

    let mut encoder = GifEncoder::new(layout.width, layout.height, options.quality, options.workers)?;
    FrameSampler::new(source, layout, schedule).run(&mut encoder, on_progress)?;
    encoder.render(&mut |p| on_progress(CAPTURE_SHARE + p * (1.0 - CAPTURE_SHARE)))
}

/// Walks `ladder` in order until an attempt's output fits `budget_bytes`.
///
/// First fit wins: earlier, higher-quality rungs are preferred and later
/// rungs are never tried once one fits. A source with no usable duration is
/// rejected before the first attempt. When the whole ladder is exhausted
/// the error carries the size of the *last* attempt, not the smallest.
///
/// `on_attempt(k, n)` announces each attempt; `on_progress` restarts from
/// zero at every attempt boundary.
pub fn transcode_to_budget<S: FrameSource>(
    source: &mut S,
    ladder: &[CompressionStep],
    budget_bytes: usize,
    workers: usize,
    mut on_attempt: impl FnMut(usize, usize),
    on_progress: &mut dyn FnMut(f64),
) -> Result<Vec<u8>> {
    let info = source.info();
    if !info.duration_sec.is_finite() || info.duration_sec <= 0.0 {
        return Err(Error::InvalidSource);
    }

    let mut last_bytes = 0usize;
    for (index, step) in ladder.iter().enumerate() {
        on_attempt(index + 1, ladder.len());
        let options = step.to_options(workers, None);
        let bytes = convert_video_to_gif(source, &options, on_progress)?;
        log::info!(
            "attempt {}/{}: {} bytes against a budget of {}",
            index + 1,
            ladder.len(),
            bytes.len(),
            budget_bytes
        );
        if bytes.len() <= budget_bytes {
            return Ok(bytes);
        }
        last_bytes = bytes.len();
    }

    Err(Error::BudgetExceeded { last_bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SyntheticSource;
    use stickerforge_core::{FitMode, SampleSpan};

    fn step(fps: f64, quality: u8, target_duration_sec: f64) -> CompressionStep {
        CompressionStep {
            width: 32,
            height: 32,
            fit: FitMode::Contain,
            fps,
            quality,
            target_duration_sec,
            sample_span: SampleSpan::First,
        }
    }

    /// Size of one rung's output on a fresh synthetic source.
    fn size_of(rung: CompressionStep) -> usize {
        let mut source = SyntheticSource::new(48, 48, 10.0);
        convert_video_to_gif(&mut source, &rung.to_options(2, None), &mut |_| {})
            .unwrap()
            .len()
    }

    #[test]
    fn explicit_conversion_matches_the_schedule() {
        // 10s source, 10 fps, 3s target: exactly 30 capture timestamps
        let mut source = SyntheticSource::new(64, 48, 10.0);
        let options = GifOptions {
            width: Some(32),
            height: Some(32),
            fps: 10.0,
            target_duration_sec: Some(3.0),
            quality: 30,
            ..GifOptions::default()
        };
        let bytes = convert_video_to_gif(&mut source, &options, &mut |_| {}).unwrap();

        assert!(bytes.starts_with(b"GIF89a"));
        assert_eq!(source.captures.len(), 30);
        assert!(source.captures.iter().all(|&t| t < 10.0));
    }

    #[test]
    fn invalid_duration_fails_before_any_attempt() {
        for duration in [f64::NAN, 0.0, -2.0, f64::INFINITY] {
            let mut source = SyntheticSource::new(32, 32, duration);
            let result = transcode_to_budget(
                &mut source,
                &[step(10.0, 12, 3.0)],
                usize::MAX,
                1,
                |_, _| {},
                &mut |_| {},
            );
            assert!(matches!(result, Err(Error::InvalidSource)), "{duration}");
            assert!(source.captures.is_empty(), "attempt ran for {duration}");
        }
    }

    #[test]
    fn first_fit_returns_without_trying_later_rungs() {
        let heavy = step(6.0, 10, 2.0);
        let light = step(1.0, 30, 1.0);
        let heavy_size = size_of(heavy);
        let light_size = size_of(light);
        assert!(heavy_size > light_size, "{heavy_size} vs {light_size}");

        let mut attempts = Vec::new();
        let mut source = SyntheticSource::new(48, 48, 10.0);
        let bytes = transcode_to_budget(
            &mut source,
            &[heavy, light, step(1.0, 30, 0.5)],
            light_size,
            2,
            |k, n| attempts.push((k, n)),
            &mut |_| {},
        )
        .unwrap();

        assert_eq!(bytes.len(), light_size);
        assert_eq!(attempts, vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn budget_fit_on_the_first_rung_returns_immediately() {
        let mut attempts = 0;
        let mut source = SyntheticSource::new(48, 48, 10.0);
        transcode_to_budget(
            &mut source,
            &[step(2.0, 30, 1.0), step(1.0, 30, 1.0)],
            usize::MAX,
            1,
            |_, _| attempts += 1,
            &mut |_| {},
        )
        .unwrap();
        assert_eq!(attempts, 1);
    }

    #[test]
    fn exhausted_ladder_reports_the_last_size_not_the_minimum() {
        // last rung is deliberately the *larger* one
        let small = step(1.0, 30, 1.0);
        let large = step(6.0, 10, 2.0);
        let large_size = size_of(large);

        let mut source = SyntheticSource::new(48, 48, 10.0);
        let result = transcode_to_budget(
            &mut source,
            &[small, large],
            1,
            2,
            |_, _| {},
            &mut |_| {},
        );

        match result {
            Err(Error::BudgetExceeded { last_bytes }) => assert_eq!(last_bytes, large_size),
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }
    }

    #[test]
    fn progress_is_monotone_within_each_attempt() {
        let segments: std::cell::RefCell<Vec<Vec<f64>>> = std::cell::RefCell::new(Vec::new());
        let mut source = SyntheticSource::new(48, 48, 10.0);
        let _ = transcode_to_budget(
            &mut source,
            &[step(3.0, 30, 1.0), step(2.0, 30, 1.0)],
            1,
            1,
            |_, _| segments.borrow_mut().push(Vec::new()),
            &mut |p| segments.borrow_mut().last_mut().unwrap().push(p),
        );

        let segments = segments.into_inner();
        assert_eq!(segments.len(), 2);
        for segment in &segments {
            assert!(!segment.is_empty());
            for pair in segment.windows(2) {
                assert!(pair[0] <= pair[1]);
            }
            assert_eq!(*segment.last().unwrap(), 1.0);
            assert!(segment[0] <= CAPTURE_SHARE);
        }
    }
}
