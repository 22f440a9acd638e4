//! Logo and badge composition.
//!
//! The embedded image follows one layout rule:
//!
//! ```text
//! no logo:        badge alone (or nothing)
//! logo, no badge: logo, untouched
//! logo + badge:   300x300 canvas
//!                 ┌──────────────────────┐
//!                 │  30px                │
//!                 │   ┌──────────────┐   │
//!                 │   │ logo 240x240 │   │
//!                 │   │        ┌─────┴─┐ │
//!                 │   └────────┤ badge │ │
//!                 │            │ 80x80 │ │
//!                 │            └───────┘ │ 15px inset
//!                 └──────────────────────┘
//! ```
//!
//! The badge is always painted after the logo.

use image::RgbaImage;
use tracing::warn;

use crate::raster::{ImageSource, LogoAsset, RectPx, composite_over, fit};

/// Side of the logo + badge canvas.
pub const CANVAS_PX: u32 = 300;

/// Side of the logo inside the canvas.
pub const LOGO_PX: u32 = 240;

/// Side of the badge when drawn over a logo.
pub const BADGE_PX: u32 = 80;

/// Gap between the badge and the bottom/right canvas edges.
pub const BADGE_INSET_PX: u32 = 15;

/// Where the logo lands on the canvas.
pub fn logo_region() -> RectPx {
    let margin = (CANVAS_PX - LOGO_PX) / 2;
    RectPx::new(margin, margin, LOGO_PX, LOGO_PX)
}

/// Where the badge lands on the canvas.
pub fn badge_region() -> RectPx {
    let origin = CANVAS_PX - BADGE_INSET_PX - BADGE_PX;
    RectPx::new(origin, origin, BADGE_PX, BADGE_PX)
}

/// Combines decoded inputs according to the layout rule.
///
/// Single inputs come back unchanged. With both present, a fresh
/// transparent canvas is allocated and the logo is stretched to
/// [`logo_region`] before the badge is painted into [`badge_region`].
pub fn compose(logo: Option<&RgbaImage>, badge: Option<&RgbaImage>) -> Option<RgbaImage> {
    match (logo, badge) {
        (None, None) => None,
        (None, Some(badge)) => Some(badge.clone()),
        (Some(logo), None) => Some(logo.clone()),
        (Some(logo), Some(badge)) => Some(draw_canvas(logo, badge)),
    }
}

fn draw_canvas(logo: &RgbaImage, badge: &RgbaImage) -> RgbaImage {
    let mut canvas = RgbaImage::new(CANVAS_PX, CANVAS_PX);

    let logo_at = logo_region();
    let logo = fit(logo, logo_at.width, logo_at.height);
    composite_over(&mut canvas, &logo, logo_at.x as i32, logo_at.y as i32);

    let badge_at = badge_region();
    let badge = fit(badge, badge_at.width, badge_at.height);
    composite_over(&mut canvas, &badge, badge_at.x as i32, badge_at.y as i32);

    canvas
}

/// Builds the image to embed from a caller logo and a rendered badge.
///
/// This is the decode-and-draw step. A logo with no badge is passed through
/// as its original data URI without decoding. If the logo cannot be decoded
/// the badge is dropped and the logo URI is returned as-is.
pub fn compose_embedded(logo: Option<&LogoAsset>, badge: Option<RgbaImage>) -> Option<ImageSource> {
    match (logo, badge) {
        (None, badge) => badge.map(ImageSource::Pixels),
        (Some(logo), None) => Some(ImageSource::DataUri(logo.as_data_uri().to_string())),
        (Some(logo), Some(badge)) => match logo.decode() {
            Ok(decoded) => compose(Some(&decoded), Some(&badge)).map(ImageSource::Pixels),
            Err(err) => {
                warn!(error = %err, "logo decode failed, embedding logo without badge");
                Some(ImageSource::DataUri(logo.as_data_uri().to_string()))
            }
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::encode_png;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn solid(size: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(size, size, color)
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert!(compose(None, None).is_none());
        assert!(compose_embedded(None, None).is_none());
    }

    #[test]
    fn single_inputs_pass_through() {
        let logo = solid(64, RED);
        let badge = solid(40, BLUE);

        assert_eq!(compose(Some(&logo), None), Some(logo.clone()));
        assert_eq!(compose(None, Some(&badge)), Some(badge.clone()));
    }

    #[test]
    fn regions_match_layout() {
        assert_eq!(logo_region(), RectPx::new(30, 30, 240, 240));
        assert_eq!(badge_region(), RectPx::new(205, 205, 80, 80));
    }

    #[test]
    fn badge_over_logo_layout() {
        let logo = solid(100, RED);
        let badge = solid(80, BLUE);
        let out = compose(Some(&logo), Some(&badge)).unwrap();

        assert_eq!(out.dimensions(), (CANVAS_PX, CANVAS_PX));

        let logo_at = logo_region();
        let badge_at = badge_region();
        for (x, y, p) in out.enumerate_pixels() {
            if badge_at.contains(x, y) {
                assert_eq!(*p, BLUE, "badge pixel expected at ({x}, {y})");
            } else if logo_at.contains(x, y) {
                assert_eq!(*p, RED, "logo pixel expected at ({x}, {y})");
            } else {
                assert_eq!(p[3], 0, "margin should stay transparent at ({x}, {y})");
            }
        }
    }

    #[test]
    fn badge_is_painted_on_top() {
        let logo = solid(240, RED);
        let badge = solid(80, BLUE);
        let out = compose(Some(&logo), Some(&badge)).unwrap();
        // (230, 230) sits in both regions
        assert_eq!(*out.get_pixel(230, 230), BLUE);
    }

    #[test]
    fn oversized_badge_is_scaled_into_corner() {
        let logo = solid(50, RED);
        let badge = solid(160, BLUE);
        let out = compose(Some(&logo), Some(&badge)).unwrap();
        assert_eq!(*out.get_pixel(204, 204), RED);
        assert_eq!(*out.get_pixel(284, 284), BLUE);
        assert_eq!(out.get_pixel(286, 286)[3], 0);
    }

    #[test]
    fn embedded_logo_only_keeps_uri() {
        let logo = LogoAsset::from_data_uri("data:image/png;base64,not-even-decoded");
        let out = compose_embedded(Some(&logo), None).unwrap();
        assert_eq!(out, ImageSource::DataUri(logo.as_data_uri().to_string()));
    }

    #[test]
    fn embedded_badge_only_is_pixels() {
        let badge = solid(40, BLUE);
        let out = compose_embedded(None, Some(badge.clone())).unwrap();
        assert_eq!(out.as_pixels(), Some(&badge));
    }

    #[test]
    fn embedded_logo_and_badge_draws_canvas() {
        let logo = LogoAsset::from_bytes(&encode_png(&solid(10, RED)).unwrap(), "image/png");
        let out = compose_embedded(Some(&logo), Some(solid(80, BLUE))).unwrap();
        let pixels = out.as_pixels().unwrap();
        assert_eq!(pixels.dimensions(), (CANVAS_PX, CANVAS_PX));
        assert_eq!(*pixels.get_pixel(150, 150), RED);
        assert_eq!(*pixels.get_pixel(250, 250), BLUE);
    }

    #[test]
    fn decode_failure_falls_back_to_logo() {
        let logo = LogoAsset::from_data_uri("data:image/png;base64,aGVsbG8=");
        let out = compose_embedded(Some(&logo), Some(solid(80, BLUE))).unwrap();
        assert_eq!(out, ImageSource::DataUri(logo.as_data_uri().to_string()));
    }
}
