//! Still-image operations for the sticker image modules
//!
//! Batch resize (letterbox with optional fill) and fixed-aspect crop, with
//! PNG/JPEG byte encoding. JPEG is kept only for JPEG sources; everything
//! else becomes PNG so transparency survives.

use std::path::Path;

use crate::compositor::{compose, compose_crop};
use crate::Result;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use stickerforge_core::{Color, CropRegion, FitMode, FrameLayout};

/// JPEG quality for re-encoded stills.
const JPEG_QUALITY: u8 = 90;

/// Output encoding for a processed still image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillFormat {
    Png,
    Jpeg,
}

impl StillFormat {
    /// Picks the output format for a given source file: JPEG sources stay
    /// JPEG, everything else becomes PNG.
    pub fn for_source(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
                StillFormat::Jpeg
            }
            _ => StillFormat::Png,
        }
    }

    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            StillFormat::Png => "png",
            StillFormat::Jpeg => "jpg",
        }
    }
}

/// Resizes a still onto a `width`×`height` canvas.
///
/// With `keep_aspect` the source is letterboxed (`Contain`) over `fill` or
/// transparency; otherwise it is stretched to the full canvas.
pub fn resize_still(
    src: &RgbaImage,
    width: u32,
    height: u32,
    keep_aspect: bool,
    fill: Option<Color>,
) -> Result<RgbaImage> {
    let fit = if keep_aspect {
        FitMode::Contain
    } else {
        FitMode::Stretch
    };
    let mut layout = FrameLayout::new(width, height, fit);
    layout.fill = fill;
    compose(src, &layout)
}

/// Crops a still to a `width`×`height` canvas.
///
/// A manual `region` is used verbatim (clamped to the source); otherwise the
/// largest centered region with the target aspect ratio is taken.
pub fn crop_still(
    src: &RgbaImage,
    width: u32,
    height: u32,
    region: Option<CropRegion>,
) -> Result<RgbaImage> {
    let region =
        region.unwrap_or_else(|| CropRegion::centered(src.width(), src.height(), width, height));
    compose_crop(src, region, width, height)
}

/// Encodes a processed still into PNG or JPEG bytes.
pub fn encode_still(image: &RgbaImage, format: StillFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        StillFormat::Png => {
            PngEncoder::new(&mut buf).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        StillFormat::Jpeg => {
            // JPEG has no alpha channel; flatten to RGB first.
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(buf)
}
