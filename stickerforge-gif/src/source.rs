//! Video frame sources backed by an exclusive decode cursor
//!
//! All FFmpeg state (demuxer, decoder, scaler) lives on one dedicated
//! thread per source: that thread is the single decode cursor, and capture
//! requests are served strictly in arrival order. The owning handle awaits
//! every reply with a bounded timeout so corrupt or unsupported media
//! cannot hang the pipeline.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use ffmpeg_next as ffmpeg;
use image::RgbaImage;

use crate::{Error, Result};

/// Bounded wait for source metadata and first-frame decodability.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(15);
/// Bounded wait for each seek-and-capture request.
pub const SEEK_TIMEOUT: Duration = Duration::from_secs(15);

static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg (call once per application)
fn init_ffmpeg() {
    FFMPEG_INIT.call_once(|| {
        ffmpeg::init().expect("Failed to initialize FFmpeg");
    });
}

/// Metadata derived from a resolved media source.
#[derive(Debug, Clone, Copy)]
pub struct SourceInfo {
    /// Source width in pixels
    pub width: u32,
    /// Source height in pixels
    pub height: u32,
    /// Duration in seconds; non-finite when the container reports none
    /// (rejected before any conversion attempt starts)
    pub duration_sec: f64,
}

/// A decodable video source able to produce the frame shown at a timestamp.
///
/// Captures are strictly sequential: implementations own a single decode
/// cursor and callers must not overlap requests.
pub trait FrameSource {
    /// Source metadata.
    fn info(&self) -> SourceInfo;

    /// Decodes and returns the frame displayed at `time_sec`.
    fn capture(&mut self, time_sec: f64) -> Result<RgbaImage>;
}

/// FFmpeg-backed frame source.
///
/// `open` resolves metadata and proves first-frame decodability before
/// returning, both under [`LOAD_TIMEOUT`]; afterwards each [`capture`]
/// seeks to the keyframe at or before the target and decodes forward,
/// under [`SEEK_TIMEOUT`].
///
/// [`capture`]: FrameSource::capture
pub struct FfmpegSource {
    info: SourceInfo,
    requests: Option<Sender<f64>>,
    replies: Receiver<Result<RgbaImage>>,
    worker: Option<JoinHandle<()>>,
    /// Keeps byte-backed sources on disk until the cursor is done.
    _scratch: Option<tempfile::NamedTempFile>,
}

impl FfmpegSource {
    /// Opens a video file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::spawn(path.as_ref().to_path_buf(), None)
    }

    /// Materializes raw video bytes into an ephemeral file and opens it.
    /// The file is removed when the source is dropped, on every exit path.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut scratch = tempfile::NamedTempFile::new()?;
        scratch.write_all(bytes)?;
        scratch.flush()?;
        let path = scratch.path().to_path_buf();
        Self::spawn(path, Some(scratch))
    }

    fn spawn(path: PathBuf, scratch: Option<tempfile::NamedTempFile>) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<f64>();
        let (reply_tx, reply_rx) = unbounded::<Result<RgbaImage>>();
        let (meta_tx, meta_rx) = bounded::<Result<SourceInfo>>(1);

        let worker = thread::Builder::new()
            .name("stickerforge-decode".into())
            .spawn(move || decode_loop(&path, &meta_tx, &request_rx, &reply_tx))?;

        let info = match meta_rx.recv_timeout(LOAD_TIMEOUT) {
            Ok(Ok(info)) => info,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(Error::SourceLoadTimeout),
        };
        log::debug!(
            "source ready: {}x{}, {:.3}s",
            info.width,
            info.height,
            info.duration_sec
        );

        let mut source = Self {
            info,
            requests: Some(request_tx),
            replies: reply_rx,
            worker: Some(worker),
            _scratch: scratch,
        };

        // Metadata alone does not prove the stream decodes; probe the first
        // frame before callers start sampling.
        source.capture_with(0.0, LOAD_TIMEOUT).map_err(|e| match e {
            Error::SeekTimeout => Error::SourceLoadTimeout,
            Error::Seek(msg) => Error::SourceLoad(msg),
            other => other,
        })?;

        Ok(source)
    }

    fn capture_with(&mut self, time_sec: f64, timeout: Duration) -> Result<RgbaImage> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| Error::Seek("decode cursor is closed".into()))?;
        requests
            .send(time_sec)
            .map_err(|_| Error::Seek("decode thread terminated".into()))?;
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => reply,
            Err(RecvTimeoutError::Timeout) => Err(Error::SeekTimeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Seek("decode thread terminated".into()))
            }
        }
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn capture(&mut self, time_sec: f64) -> Result<RgbaImage> {
        self.capture_with(time_sec, SEEK_TIMEOUT)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        // Closing the request channel lets the decode thread exit once its
        // current operation finishes.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Entry point of the decode thread: owns the cursor for its whole life.
fn decode_loop(
    path: &Path,
    meta_tx: &Sender<Result<SourceInfo>>,
    requests: &Receiver<f64>,
    replies: &Sender<Result<RgbaImage>>,
) {
    init_ffmpeg();

    let mut cursor = match DecodeCursor::open(path) {
        Ok(cursor) => cursor,
        Err(e) => {
            let _ = meta_tx.send(Err(e));
            return;
        }
    };
    if meta_tx.send(Ok(cursor.info())).is_err() {
        return;
    }

    while let Ok(time_sec) = requests.recv() {
        let reply = cursor.frame_at(time_sec);
        if replies.send(reply).is_err() {
            break;
        }
    }
}

/// The single decode cursor: demuxer position, decoder state and scaler.
struct DecodeCursor {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<ffmpeg::software::scaling::Context>,
    stream_index: usize,
    time_base: f64,
    duration_sec: f64,
}

impl DecodeCursor {
    fn open(path: &Path) -> Result<Self> {
        let input =
            ffmpeg::format::input(&path).map_err(|e| Error::SourceLoad(e.to_string()))?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(Error::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = f64::from(stream.time_base());

        let duration_sec = if stream.duration() > 0 {
            stream.duration() as f64 * time_base
        } else if input.duration() > 0 {
            // Fallback to container duration
            input.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE)
        } else {
            f64::NAN
        };

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = context.decoder().video()?;

        Ok(Self {
            input,
            decoder,
            scaler: None,
            stream_index,
            time_base,
            duration_sec,
        })
    }

    fn info(&self) -> SourceInfo {
        SourceInfo {
            width: self.decoder.width(),
            height: self.decoder.height(),
            duration_sec: self.duration_sec,
        }
    }

    /// Seeks to the keyframe at or before `time_sec`, then decodes forward
    /// until the display timestamp reaches it.
    fn frame_at(&mut self, time_sec: f64) -> Result<RgbaImage> {
        let target_ts = (time_sec * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
        self.input
            .seek(target_ts, ..target_ts)
            .map_err(|e| Error::Seek(e.to_string()))?;
        self.decoder.flush();

        let time_base = self.time_base;
        let mut decoded = ffmpeg::frame::Video::empty();
        let mut last: Option<RgbaImage> = None;

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            self.decoder
                .send_packet(&packet)
                .map_err(|e| Error::Seek(e.to_string()))?;
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts_sec = decoded
                    .pts()
                    .or_else(|| decoded.timestamp())
                    .map(|pts| pts as f64 * time_base)
                    .unwrap_or(0.0);
                let frame = convert_frame(&mut self.scaler, &decoded)?;
                if pts_sec >= time_sec {
                    return Ok(frame);
                }
                last = Some(frame);
            }
        }

        // Stream ended before the target; drain held frames and fall back
        // to the last one seen.
        let _ = self.decoder.send_eof();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            last = Some(convert_frame(&mut self.scaler, &decoded)?);
        }
        last.ok_or_else(|| Error::Seek(format!("no frame decodable at {time_sec:.3}s")))
    }
}

/// Converts a decoded frame to packed RGBA, honoring the frame stride. The
/// scaler is created on the first frame, once the pixel format is known.
fn convert_frame(
    scaler: &mut Option<ffmpeg::software::scaling::Context>,
    decoded: &ffmpeg::frame::Video,
) -> Result<RgbaImage> {
    if scaler.is_none() {
        *scaler = Some(
            ffmpeg::software::scaling::Context::get(
                decoded.format(),
                decoded.width(),
                decoded.height(),
                ffmpeg::format::Pixel::RGBA,
                decoded.width(),
                decoded.height(),
                ffmpeg::software::scaling::Flags::BILINEAR,
            )
            .map_err(|e| Error::Seek(e.to_string()))?,
        );
    }

    let mut rgba = ffmpeg::frame::Video::empty();
    if let Some(scaler) = scaler.as_mut() {
        scaler
            .run(decoded, &mut rgba)
            .map_err(|e| Error::Seek(e.to_string()))?;
    }

    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    let stride = rgba.stride(0);
    let data = rgba.data(0);

    let mut pixels = Vec::with_capacity(width * height * 4);
    for row in 0..height {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + width * 4]);
    }

    RgbaImage::from_raw(rgba.width(), rgba.height(), pixels)
        .ok_or_else(|| Error::Seek("decoded frame has an invalid size".into()))
}
