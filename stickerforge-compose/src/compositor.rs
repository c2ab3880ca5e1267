//! Compositing source bitmaps onto fixed-size output canvases

use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba, RgbaImage};
use stickerforge_core::{CropRegion, FitMode, FrameLayout};

/// Resample filter used for all scaling operations.
const FILTER: FilterType = FilterType::Triangle;

/// Composites a source bitmap onto a canvas described by `layout`.
///
/// `Stretch` fills the whole canvas, ignoring aspect ratio. `Contain`
/// uniform-scales the source, centers it (offsets floored), and pads the
/// remainder with the layout's fill color or transparency.
pub fn compose(src: &RgbaImage, layout: &FrameLayout) -> Result<RgbaImage> {
    let (out_w, out_h) = (layout.width, layout.height);
    if out_w == 0 || out_h == 0 {
        return Err(Error::Surface(out_w, out_h));
    }
    if src.width() == 0 || src.height() == 0 {
        return Err(Error::EmptyRegion);
    }

    match layout.fit {
        FitMode::Stretch => Ok(imageops::resize(src, out_w, out_h, FILTER)),
        FitMode::Contain => {
            let scale = (f64::from(out_w) / f64::from(src.width()))
                .min(f64::from(out_h) / f64::from(src.height()));
            let draw_w = ((f64::from(src.width()) * scale).round() as u32).max(1);
            let draw_h = ((f64::from(src.height()) * scale).round() as u32).max(1);
            let offset_x = (out_w - draw_w.min(out_w)) / 2;
            let offset_y = (out_h - draw_h.min(out_h)) / 2;

            let background = Rgba(layout.fill.unwrap_or([0, 0, 0, 0]));
            let mut canvas = ImageBuffer::from_pixel(out_w, out_h, background);
            let scaled = imageops::resize(src, draw_w, draw_h, FILTER);
            imageops::overlay(&mut canvas, &scaled, i64::from(offset_x), i64::from(offset_y));
            Ok(canvas)
        }
    }
}

/// Resamples a source sub-rectangle onto the full output rectangle.
///
/// This is the crop mode used by the fixed-aspect image modules: no
/// letterboxing, the region itself is stretched to the output size. The
/// region is clamped to the source bounds first.
pub fn compose_crop(
    src: &RgbaImage,
    region: CropRegion,
    out_width: u32,
    out_height: u32,
) -> Result<RgbaImage> {
    if out_width == 0 || out_height == 0 {
        return Err(Error::Surface(out_width, out_height));
    }
    if region.x >= src.width() || region.y >= src.height() {
        return Err(Error::EmptyRegion);
    }

    let width = region.width.min(src.width() - region.x);
    let height = region.height.min(src.height() - region.y);
    if width == 0 || height == 0 {
        return Err(Error::EmptyRegion);
    }

    let view = imageops::crop_imm(src, region.x, region.y, width, height).to_image();
    Ok(imageops::resize(&view, out_width, out_height, FILTER))
}
