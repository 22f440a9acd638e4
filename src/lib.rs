//! qr-composer: payload encoding and center-image composition for styled QR codes
//!
//! This crate turns an editable QR configuration (content type, colors,
//! size, logo, type badge) into complete updates for a QR rendering
//! component, and forwards download requests to it.
//!
//! # Example
//!
//! ```
//! use qr_composer::{Composer, ContactRecord, QrConfig, QrRenderer, QrType};
//!
//! let mut composer = Composer::new(QrRenderer::new(), QrConfig::default());
//! composer.set_qr_type(QrType::Contact);
//! composer.set_contact(ContactRecord::new("Ana", "123", "a@b.com", "Acme"));
//! composer.set_show_badge(true);
//!
//! let update = composer.last_applied().unwrap();
//! assert!(update.content.starts_with("BEGIN:VCARD\nVERSION:3.0\nFN:Ana"));
//! assert!(update.image.is_some());
//! ```
//!
//! # Payloads Only
//!
//! The encoder is a plain function and can be used on its own:
//!
//! ```
//! use qr_composer::{encode, ContactRecord, Encryption, QrType, WifiCredentials};
//!
//! let wifi = WifiCredentials::new("Home", "secret", Encryption::Wpa);
//! let payload = encode(QrType::Wifi, "", "", &wifi, &ContactRecord::default());
//! assert_eq!(payload, "WIFI:T:WPA;S:Home;P:secret;;");
//! ```

mod badge;
mod compose;
mod composer;
mod config;
mod error;
mod payload;
mod raster;
mod render;

pub use badge::{BadgeCache, BadgeSize, badge_svg, rasterize_badge, render_badge};
pub use compose::{
    BADGE_INSET_PX, BADGE_PX, CANVAS_PX, LOGO_PX, badge_region, compose, compose_embedded,
    logo_region,
};
pub use composer::{
    BackgroundOptions, Composer, DOWNLOAD_NAME, DotStyle, DotsOptions, DownloadFormat,
    DownloadRequest, ImageOptions, RenderState, RenderUpdate, Renderer,
};
pub use config::{
    Color, DEFAULT_SIZE_PX, MAX_SIZE_PX, MIN_SIZE_PX, QrConfig, Template, VisualConfig, clamp_size,
};
pub use error::{Error, Result};
pub use payload::{ContactRecord, Encryption, QrType, WifiCredentials, encode, encode_vcard, encode_wifi};
pub use raster::{ImageSource, LogoAsset, RectPx, decode_data_uri, encode_png_data_uri};
pub use render::{ExportedFile, QrRenderer};
