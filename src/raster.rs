//! Raster types and pixel helpers.
//!
//! Images cross the crate boundary as `data:` URIs (that is how the caller
//! hands over a logo and how the rendering collaborator expects the embedded
//! image). Inside the crate they are plain [`RgbaImage`] buffers.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

// ============================================================================
// Geometry
// ============================================================================

/// A rectangle defined in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Returns the bottom edge coordinate (y + height).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Returns true if the pixel at `(x, y)` lies inside the rectangle.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

// ============================================================================
// LogoAsset
// ============================================================================

/// A caller-supplied logo, carried as the `data:` URI the caller produced.
///
/// The core never alters it; it only decodes a copy when it has to draw
/// the badge on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogoAsset(String);

impl LogoAsset {
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Wraps raw encoded image bytes (PNG, JPEG, ...) into a data URI.
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    /// Decodes the logo into pixels.
    pub fn decode(&self) -> Result<RgbaImage> {
        decode_data_uri(&self.0)
    }
}

// ============================================================================
// ImageSource
// ============================================================================

/// An image handed to the rendering collaborator.
///
/// Either freshly drawn pixels or an untouched caller data URI. Both forms
/// serialize to a data URI string.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Pixels drawn by this crate.
    Pixels(RgbaImage),
    /// A data URI passed through as received.
    DataUri(String),
}

impl ImageSource {
    /// Returns the image as a `data:` URI, encoding pixels as PNG.
    pub fn to_data_uri(&self) -> Result<String> {
        match self {
            ImageSource::Pixels(img) => encode_png_data_uri(img),
            ImageSource::DataUri(uri) => Ok(uri.clone()),
        }
    }

    /// Returns the image as pixels, decoding a data URI if needed.
    pub fn to_pixels(&self) -> Result<RgbaImage> {
        match self {
            ImageSource::Pixels(img) => Ok(img.clone()),
            ImageSource::DataUri(uri) => decode_data_uri(uri),
        }
    }

    pub fn as_pixels(&self) -> Option<&RgbaImage> {
        match self {
            ImageSource::Pixels(img) => Some(img),
            ImageSource::DataUri(_) => None,
        }
    }
}

impl Serialize for ImageSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let uri = self.to_data_uri().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&uri)
    }
}

// ============================================================================
// Data URIs
// ============================================================================

/// Decodes a base64 `data:` URI into an RGBA buffer.
pub fn decode_data_uri(uri: &str) -> Result<RgbaImage> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or(Error::InvalidDataUri("missing data: scheme"))?;
    let (meta, body) = rest
        .split_once(',')
        .ok_or(Error::InvalidDataUri("missing ',' separator"))?;
    if !meta.ends_with(";base64") {
        return Err(Error::InvalidDataUri("only base64 payloads are supported"));
    }

    let bytes = STANDARD.decode(body.trim())?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

/// Encodes an RGBA buffer as PNG and wraps it in a `data:image/png` URI.
pub fn encode_png_data_uri(img: &RgbaImage) -> Result<String> {
    let bytes = encode_png(img)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}

/// Encodes an RGBA buffer as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img.clone()).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

// ============================================================================
// Scaling & Compositing
// ============================================================================

/// Stretches `img` to exactly `width x height`, leaving it untouched if it
/// already has that size.
pub fn fit(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.width() == width && img.height() == height {
        return img.clone();
    }
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

/// Paints `src` over `dest` with its top-left corner at `(x, y)`.
///
/// Straight-alpha source-over. Parts of `src` falling outside `dest` are
/// clipped.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let (width, height) = (i64::from(dest.width()), i64::from(dest.height()));

    for (sx, sy, top) in src.enumerate_pixels() {
        let dx = i64::from(x) + i64::from(sx);
        let dy = i64::from(y) + i64::from(sy);
        if !(0..width).contains(&dx) || !(0..height).contains(&dy) {
            continue;
        }
        let under = dest.get_pixel_mut(dx as u32, dy as u32);
        *under = source_over(*top, *under);
    }
}

fn source_over(top: Rgba<u8>, bottom: Rgba<u8>) -> Rgba<u8> {
    match top[3] {
        255 => return top,
        0 => return bottom,
        _ => {}
    }

    let top_a = f32::from(top[3]) / 255.0;
    let bottom_a = f32::from(bottom[3]) / 255.0 * (1.0 - top_a);
    let out_a = top_a + bottom_a;

    let channel = |i: usize| {
        let v = (f32::from(top[i]) * top_a + f32::from(bottom[i]) * bottom_a) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([channel(0), channel(1), channel(2), (out_a * 255.0).round() as u8])
}

// ============================================================================
// Tests
// ============================================================================
