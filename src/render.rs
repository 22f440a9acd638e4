//! In-process rendering collaborator built on the `qrcode` crate.
//!
//! [`QrRenderer`] accepts [`RenderUpdate`]s, lays out the symbol with round
//! dots, clears the modules under the embedded image when asked to, and
//! exports PNG or SVG files into an outbox the caller drains.

use image::{Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use tracing::{debug, warn};

use crate::composer::{DownloadFormat, DownloadRequest, RenderUpdate, Renderer};
use crate::error::{Error, Result};
use crate::raster::{composite_over, encode_png, fit};

// ============================================================================
// ExportedFile
// ============================================================================

/// A file produced by a download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub format: DownloadFormat,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// `<filename>.<extension>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.filename, self.format.extension())
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Pixel geometry of one rendered symbol.
struct Layout {
    side: f32,
    modules: usize,
    module_px: f32,
    /// `(origin, side)` of the embedded image, in pixels.
    image: Option<(f32, f32)>,
    /// Half-open pixel range, on both axes, where dots are suppressed.
    cleared: Option<(f32, f32)>,
}

impl Layout {
    fn new(update: &RenderUpdate, modules: usize, has_image: bool) -> Self {
        let side = update.width as f32;
        let module_px = side / modules as f32;

        let image = has_image.then(|| {
            let image_side = (side * update.image_options.image_size).round();
            ((side - image_side) / 2.0, image_side)
        });
        let cleared = image
            .filter(|_| update.image_options.hide_background_dots)
            .map(|(origin, image_side)| {
                let margin = update.image_options.margin as f32;
                (origin - margin, origin + image_side + margin)
            });

        Self {
            side,
            modules,
            module_px,
            image,
            cleared,
        }
    }

    fn center(&self, index: usize) -> f32 {
        (index as f32 + 0.5) * self.module_px
    }

    fn is_cleared(&self, x: usize, y: usize) -> bool {
        self.cleared.is_some_and(|(lo, hi)| {
            let (cx, cy) = (self.center(x), self.center(y));
            cx >= lo && cx < hi && cy >= lo && cy < hi
        })
    }

    /// Dark modules that should actually be drawn, as `(column, row)`.
    fn dots<'a>(&'a self, code: &'a QrCode) -> impl Iterator<Item = (usize, usize)> + 'a {
        (0..self.modules)
            .flat_map(move |y| (0..self.modules).map(move |x| (x, y)))
            .filter(move |&(x, y)| code[(x, y)] == qrcode::Color::Dark && !self.is_cleared(x, y))
    }
}

// ============================================================================
// QrRenderer
// ============================================================================

struct Displayed {
    update: RenderUpdate,
    code: QrCode,
    image: Option<RgbaImage>,
}

/// Reference [`Renderer`] that draws symbols in memory.
#[derive(Default)]
pub struct QrRenderer {
    displayed: Option<Displayed>,
    downloads: Vec<ExportedFile>,
}

impl QrRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The update currently displayed, if any.
    pub fn current(&self) -> Option<&RenderUpdate> {
        self.displayed.as_ref().map(|d| &d.update)
    }

    /// Drains exported files.
    pub fn take_downloads(&mut self) -> Vec<ExportedFile> {
        std::mem::take(&mut self.downloads)
    }

    fn displayed(&self) -> Result<&Displayed> {
        self.displayed.as_ref().ok_or(Error::NothingRendered)
    }

    /// Rasterizes the displayed symbol.
    pub fn render_png(&self) -> Result<RgbaImage> {
        let shown = self.displayed()?;
        let update = &shown.update;
        let layout = Layout::new(update, shown.code.width(), shown.image.is_some());

        let mut canvas = RgbaImage::from_pixel(
            update.width,
            update.height,
            Rgba(update.background_options.color.rgba()),
        );
        let dot = Rgba(update.dots_options.color.rgba());
        for (mx, my) in layout.dots(&shown.code) {
            fill_dot(&mut canvas, &layout, mx, my, dot);
        }

        if let (Some(img), Some((origin, image_side))) = (&shown.image, layout.image) {
            let side = image_side as u32;
            if side > 0 {
                let scaled = fit(img, side, side);
                composite_over(&mut canvas, &scaled, origin as i32, origin as i32);
            }
        }
        Ok(canvas)
    }

    /// Describes the displayed symbol as an SVG document.
    pub fn render_svg(&self) -> Result<String> {
        let shown = self.displayed()?;
        let update = &shown.update;
        let layout = Layout::new(update, shown.code.width(), shown.image.is_some());
        let radius = layout.module_px / 2.0;

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = update.width,
            h = update.height,
        );
        svg.push_str(&format!(
            r#"<rect width="{}" height="{}" fill="{}"/>"#,
            update.width, update.height, update.background_options.color
        ));
        svg.push_str(&format!(r#"<g fill="{}">"#, update.dots_options.color));
        for (mx, my) in layout.dots(&shown.code) {
            svg.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="{}"/>"#,
                layout.center(mx),
                layout.center(my),
                radius
            ));
        }
        svg.push_str("</g>");

        if let (Some(source), Some((origin, image_side))) = (&update.image, layout.image) {
            svg.push_str(&format!(
                r#"<image x="{origin}" y="{origin}" width="{image_side}" height="{image_side}" xlink:href="{}"/>"#,
                source.to_data_uri()?
            ));
        }
        svg.push_str("</svg>");
        Ok(svg)
    }
}

/// Paints one round module.
fn fill_dot(canvas: &mut RgbaImage, layout: &Layout, mx: usize, my: usize, color: Rgba<u8>) {
    let (cx, cy) = (layout.center(mx), layout.center(my));
    let r = layout.module_px / 2.0;
    let x0 = (cx - r).floor().max(0.0) as u32;
    let y0 = (cy - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil().min(layout.side) as u32).min(canvas.width());
    let y1 = ((cy + r).ceil().min(layout.side) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r * r {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}

impl Renderer for QrRenderer {
    fn update(&mut self, update: &RenderUpdate) -> Result<()> {
        let code = QrCode::with_error_correction_level(update.content.as_bytes(), EcLevel::Q)?;

        let image = match update.image.as_ref().map(|source| source.to_pixels()).transpose() {
            Ok(image) => image,
            Err(err) => {
                warn!(error = %err, "embedded image could not be decoded, rendering without it");
                None
            }
        };

        debug!(modules = code.width(), width = update.width, "symbol updated");
        self.displayed = Some(Displayed {
            update: update.clone(),
            code,
            image,
        });
        Ok(())
    }

    fn download(&mut self, request: &DownloadRequest) -> Result<()> {
        let bytes = match request.format {
            DownloadFormat::Png => encode_png(&self.render_png()?)?,
            DownloadFormat::Svg => self.render_svg()?.into_bytes(),
        };
        self.downloads.push(ExportedFile {
            filename: request.filename.clone(),
            format: request.format,
            bytes,
        });
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
