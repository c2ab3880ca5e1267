//! GIF encoding with per-frame palettes and parallel quantization

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::unbounded;
use gif::{Frame, Repeat};
use image::RgbaImage;

use crate::{Error, Result};

/// Single-use GIF encode session for one conversion attempt.
///
/// Frames are queued in presentation order with their display delay.
/// `render` quantizes them (one local palette per frame, which keeps frames
/// independent so quantization can fan out across worker threads without
/// ever reordering the output) and returns the encoded bytes.
pub struct GifEncoder {
    width: u16,
    height: u16,
    speed: i32,
    workers: usize,
    frames: Vec<(RgbaImage, u16)>,
}

impl GifEncoder {
    /// Creates an encoder for a fixed canvas size.
    ///
    /// `quality` is the quantizer sampling interval (1–30, lower is higher
    /// fidelity and larger output), mapped directly onto the NeuQuant speed
    /// parameter. `workers` is a parallelism hint, clamped to the available
    /// cores.
    pub fn new(width: u32, height: u32, quality: u8, workers: usize) -> Result<Self> {
        if width == 0 || height == 0 || width > u32::from(u16::MAX) || height > u32::from(u16::MAX)
        {
            return Err(Error::Encoding(format!(
                "canvas {width}x{height} is outside GIF limits"
            )));
        }
        Ok(Self {
            width: width as u16,
            height: height as u16,
            speed: i32::from(quality.clamp(1, 30)),
            workers: workers.clamp(1, num_cpus::get()),
            frames: Vec::new(),
        })
    }

    /// Queues one composited frame with its display delay in milliseconds.
    /// Frames must arrive in presentation order.
    pub fn add_frame(&mut self, image: RgbaImage, delay_ms: f64) -> Result<()> {
        if image.width() != u32::from(self.width) || image.height() != u32::from(self.height) {
            return Err(Error::Encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height,
            )));
        }
        // GIF delays are in centiseconds; anything below 1 stalls players.
        let delay_cs = (delay_ms / 10.0).round().max(1.0) as u16;
        self.frames.push((image, delay_cs));
        Ok(())
    }

    /// Number of queued frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Encodes the queued frames and returns the GIF byte stream.
    ///
    /// Consumes the session; a fresh encoder is required for each attempt.
    /// `on_progress` receives monotonically non-decreasing values in
    /// `[0, 1]`, driven by quantization completion.
    pub fn render(self, on_progress: &mut dyn FnMut(f64)) -> Result<Vec<u8>> {
        let Self {
            width,
            height,
            speed,
            workers,
            frames,
        } = self;

        if frames.is_empty() {
            return Err(Error::Encoding("no frames queued".into()));
        }

        let quantized = quantize_frames(&frames, width, height, speed, workers, on_progress);

        let mut bytes = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut bytes, width, height, &[])
                .map_err(|e| Error::Encoding(e.to_string()))?;
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| Error::Encoding(e.to_string()))?;
            for frame in &quantized {
                encoder
                    .write_frame(frame)
                    .map_err(|e| Error::Encoding(e.to_string()))?;
            }
        }

        on_progress(1.0);
        Ok(bytes)
    }
}

/// Quantizes frames to indexed color on up to `workers` threads.
///
/// Results are collected back into presentation order; `on_progress` runs
/// on the calling thread and counts completed frames.
fn quantize_frames(
    frames: &[(RgbaImage, u16)],
    width: u16,
    height: u16,
    speed: i32,
    workers: usize,
    on_progress: &mut dyn FnMut(f64),
) -> Vec<Frame<'static>> {
    let total = frames.len();
    let workers = workers.clamp(1, total);
    let next = AtomicUsize::new(0);
    let (done_tx, done_rx) = unbounded::<(usize, Frame<'static>)>();

    let mut out: Vec<Option<Frame<'static>>> = Vec::new();
    out.resize_with(total, || None);

    thread::scope(|scope| {
        for _ in 0..workers {
            let done_tx = done_tx.clone();
            let next = &next;
            scope.spawn(move || loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= total {
                    break;
                }
                let (image, delay_cs) = &frames[index];
                let mut pixels = image.as_raw().clone();
                let mut frame = Frame::from_rgba_speed(width, height, &mut pixels, speed);
                frame.delay = *delay_cs;
                if done_tx.send((index, frame)).is_err() {
                    break;
                }
            });
        }
        drop(done_tx);

        let mut received = 0usize;
        while let Ok((index, frame)) = done_rx.recv() {
            out[index] = Some(frame);
            received += 1;
            on_progress(received as f64 / total as f64);
        }
    });

    out.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::patterned_frame;

    fn encode(frame_count: usize, workers: usize) -> Vec<u8> {
        let mut encoder = GifEncoder::new(32, 32, 30, workers).unwrap();
        for i in 0..frame_count {
            encoder
                .add_frame(patterned_frame(32, 32, i as u64), 100.0)
                .unwrap();
        }
        encoder.render(&mut |_| {}).unwrap()
    }

    #[test]
    fn output_is_a_looping_gif() {
        let bytes = encode(3, 1);
        assert!(bytes.starts_with(b"GIF89a"));
        assert_eq!(*bytes.last().unwrap(), 0x3B);
    }

    #[test]
    fn parallel_and_serial_quantization_agree() {
        // order preservation: fan-out must not change the byte stream
        assert_eq!(encode(6, 1), encode(6, 4));
    }

    #[test]
    fn decoded_frames_keep_count_and_delay() {
        let bytes = encode(4, 2);

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(&bytes[..]).unwrap();
        let mut count = 0;
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            assert_eq!(frame.delay, 10); // 100 ms
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn progress_is_monotone_and_finishes_at_one() {
        let mut encoder = GifEncoder::new(16, 16, 30, 2).unwrap();
        for i in 0..5 {
            encoder
                .add_frame(patterned_frame(16, 16, i as u64), 50.0)
                .unwrap();
        }
        let mut seen = Vec::new();
        encoder.render(&mut |p| seen.push(p)).unwrap();

        assert!(!seen.is_empty());
        for pair in seen.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert_eq!(*seen.last().unwrap(), 1.0);
    }

    #[test]
    fn mismatched_frame_is_rejected() {
        let mut encoder = GifEncoder::new(32, 32, 10, 1).unwrap();
        let err = encoder
            .add_frame(patterned_frame(16, 16, 0), 100.0)
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn empty_session_cannot_render() {
        let encoder = GifEncoder::new(32, 32, 10, 1).unwrap();
        assert!(matches!(
            encoder.render(&mut |_| {}),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        assert!(GifEncoder::new(70_000, 32, 10, 1).is_err());
        assert!(GifEncoder::new(0, 32, 10, 1).is_err());
    }

    #[test]
    fn short_delays_never_round_to_zero() {
        let mut encoder = GifEncoder::new(8, 8, 30, 1).unwrap();
        encoder.add_frame(patterned_frame(8, 8, 0), 3.0).unwrap();
        let bytes = encoder.render(&mut |_| {}).unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(&bytes[..]).unwrap();
        let frame = decoder.read_next_frame().unwrap().unwrap();
        assert_eq!(frame.delay, 1);
    }
}
