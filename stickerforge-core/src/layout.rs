//! Output canvas geometry: fit modes, fill colors and crop regions

use crate::{Error, Result};

/// Straight-alpha RGBA color.
pub type Color = [u8; 4];

/// How a source bitmap maps onto the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FitMode {
    /// Fill the whole canvas, ignoring aspect ratio (distortion allowed).
    #[default]
    Stretch,
    /// Uniform scale preserving aspect ratio, centered; the remainder is
    /// padded with the fill color or left transparent.
    Contain,
}

/// Describes the fixed-size output surface for one conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Source-to-canvas mapping
    pub fit: FitMode,
    /// Padding color for `Contain`; `None` leaves the padding transparent
    pub fill: Option<Color>,
}

impl FrameLayout {
    /// Creates a layout with transparent padding.
    pub fn new(width: u32, height: u32, fit: FitMode) -> Self {
        Self {
            width,
            height,
            fit,
            fill: None,
        }
    }

    /// Sets the padding color used by `Contain`.
    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }
}

/// A sub-rectangle of a source bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CropRegion {
    /// Left edge in source pixels
    pub x: u32,
    /// Top edge in source pixels
    pub y: u32,
    /// Region width in source pixels
    pub width: u32,
    /// Region height in source pixels
    pub height: u32,
}

impl CropRegion {
    /// Creates a new crop region.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Largest centered region of the source matching the target aspect ratio.
    ///
    /// Sources wider than the target keep full height and take a horizontally
    /// centered slice; taller sources keep full width and take a vertically
    /// centered slice. The result never exceeds the source bounds.
    pub fn centered(
        src_width: u32,
        src_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Self {
        // source_ratio > target_ratio, compared without division
        if u64::from(src_width) * u64::from(target_height)
            > u64::from(src_height) * u64::from(target_width)
        {
            let height = src_height.max(1);
            let width = ((f64::from(src_height) * f64::from(target_width)
                / f64::from(target_height.max(1)))
            .round() as u32)
                .clamp(1, src_width.max(1));
            Self {
                x: (src_width - width) / 2,
                y: 0,
                width,
                height,
            }
        } else {
            let width = src_width.max(1);
            let height = ((f64::from(src_width) * f64::from(target_height)
                / f64::from(target_width.max(1)))
            .round() as u32)
                .clamp(1, src_height.max(1));
            Self {
                x: 0,
                y: (src_height - height) / 2,
                width,
                height,
            }
        }
    }
}

/// Parses a CSS-style color literal into straight-alpha RGBA.
///
/// Accepts `transparent`, `#rgb`, `#rrggbb` and `#rrggbbaa`.
pub fn parse_color(value: &str) -> Result<Color> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("transparent") {
        return Ok([0, 0, 0, 0]);
    }

    let hex = value
        .strip_prefix('#')
        .ok_or_else(|| Error::InvalidColor(value.to_string()))?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidColor(value.to_string()));
    }

    let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| Error::InvalidColor(value.into()));
    match hex.len() {
        3 => {
            let mut out = [0u8; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = byte(&c.to_string())?;
                out[i] = v << 4 | v;
            }
            out[3] = 255;
            Ok(out)
        }
        6 => Ok([
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            255,
        ]),
        8 => Ok([
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
        ]),
        _ => Err(Error::InvalidColor(value.to_string())),
    }
}
