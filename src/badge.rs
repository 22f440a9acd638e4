//! Type badge rendering.
//!
//! A badge is a white disc with a soft drop shadow and a stroked glyph for
//! the active [`QrType`]. It is described as SVG and rasterized with
//! resvg, so the same type and size always yield the same pixels.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use tracing::warn;

use crate::error::{Error, Result};
use crate::payload::QrType;

/// Gap between the disc and the edge of the badge canvas.
pub const DISC_INSET_PX: f32 = 2.0;

/// Glyph side as a fraction of the badge side.
pub const GLYPH_RATIO: f32 = 0.5;

const GLYPH_COLOR: &str = "#1F2937";

// ============================================================================
// BadgeSize
// ============================================================================

/// The two badge sizes the compositor asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeSize {
    /// Standalone badge, embedded by itself (40px).
    Default,
    /// Badge drawn over a logo (80px).
    Large,
}

impl BadgeSize {
    pub fn px(&self) -> u32 {
        match self {
            BadgeSize::Default => 40,
            BadgeSize::Large => 80,
        }
    }
}

// ============================================================================
// Glyphs
// ============================================================================

/// Stroked glyph markup on a 24x24 grid.
fn glyph_markup(qr_type: QrType) -> &'static str {
    match qr_type {
        // globe
        QrType::Url => concat!(
            r#"<circle cx="12" cy="12" r="10"/>"#,
            r#"<path d="M2 12h20"/>"#,
            r#"<path d="M12 2a15 15 0 0 1 4 10a15 15 0 0 1-4 10a15 15 0 0 1-4-10a15 15 0 0 1 4-10z"/>"#,
        ),
        // signal arcs
        QrType::Wifi => concat!(
            r#"<path d="M1.5 9a16 16 0 0 1 21 0"/>"#,
            r#"<path d="M5 12.5a11 11 0 0 1 14 0"/>"#,
            r#"<path d="M8.5 16a6 6 0 0 1 7 0"/>"#,
            r#"<circle cx="12" cy="20" r="1" fill="currentColor"/>"#,
        ),
        // person
        QrType::Contact => concat!(
            r#"<circle cx="12" cy="7" r="4"/>"#,
            r#"<path d="M4 21v-2a4 4 0 0 1 4-4h8a4 4 0 0 1 4 4v2"/>"#,
        ),
        // document
        QrType::Text => concat!(
            r#"<path d="M14 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V8z"/>"#,
            r#"<path d="M14 2v6h6"/>"#,
            r#"<path d="M16 13H8"/>"#,
            r#"<path d="M16 17H8"/>"#,
        ),
    }
}

// ============================================================================
// SVG Description
// ============================================================================

/// Builds the SVG document for a badge of `size` pixels.
///
/// Layers, back to front: drop shadow, white disc inset
/// [`DISC_INSET_PX`], glyph centered at [`GLYPH_RATIO`] of `size`.
pub fn badge_svg(qr_type: QrType, size: u32) -> String {
    let s = size as f32;
    let center = s / 2.0;
    let radius = (center - DISC_INSET_PX).max(0.0);
    let glyph = s * GLYPH_RATIO;
    let offset = center - glyph / 2.0;
    let scale = glyph / 24.0;
    let shadow = (s / 40.0).max(0.5);

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#,
            r#"<defs><filter id="shadow" x="-20%" y="-20%" width="140%" height="140%">"#,
            r##"<feDropShadow dx="0" dy="{shadow}" stdDeviation="{shadow}" flood-color="#000000" flood-opacity="0.25"/>"##,
            r#"</filter></defs>"#,
            r##"<circle cx="{center}" cy="{center}" r="{radius}" fill="#FFFFFF" filter="url(#shadow)"/>"##,
            r#"<g transform="translate({offset} {offset}) scale({scale})" color="{color}" fill="none" stroke="{color}" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">"#,
            "{glyph}",
            r#"</g></svg>"#,
        ),
        size = size,
        shadow = shadow,
        center = center,
        radius = radius,
        offset = offset,
        scale = scale,
        color = GLYPH_COLOR,
        glyph = glyph_markup(qr_type),
    )
}

// ============================================================================
// Rasterization
// ============================================================================

/// Rasterizes the badge for `qr_type` into a `size x size` buffer.
pub fn rasterize_badge(qr_type: QrType, size: u32) -> Result<RgbaImage> {
    let svg = badge_svg(qr_type, size);
    let tree = Tree::from_str(&svg, &Options::default()).map_err(|_| Error::Rasterize)?;

    let mut pixmap = Pixmap::new(size, size).ok_or(Error::Rasterize)?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Renders the badge, or returns `None` when badges are switched off.
///
/// Rasterization failures are logged and also yield `None`.
pub fn render_badge(qr_type: QrType, size: u32, show: bool) -> Option<RgbaImage> {
    if !show {
        return None;
    }
    match rasterize_badge(qr_type, size) {
        Ok(img) => Some(img),
        Err(err) => {
            warn!(%qr_type, size, error = %err, "badge rasterization failed");
            None
        }
    }
}

/// Converts tiny_skia's premultiplied pixels to straight-alpha RGBA.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

// ============================================================================
// BadgeCache
// ============================================================================

/// Memoizes rendered badges by type and pixel size.
///
/// Badges are pure functions of their key, so entries never go stale.
#[derive(Debug, Default)]
pub struct BadgeCache {
    cache: HashMap<(QrType, u32), RgbaImage>,
}

impl BadgeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the badge for `qr_type` at `size`, rendering it on first use.
    pub fn get(&mut self, qr_type: QrType, size: BadgeSize) -> Option<RgbaImage> {
        let key = (qr_type, size.px());
        if let Some(img) = self.cache.get(&key) {
            return Some(img.clone());
        }
        let img = render_badge(qr_type, size.px(), true)?;
        self.cache.insert(key, img.clone());
        Some(img)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
