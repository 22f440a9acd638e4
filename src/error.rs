//! Error type shared by the composition engine and the reference renderer.
//!
//! Recompute never surfaces these to the caller; they only escape from the
//! edges of the crate (parsing colors, looking up templates, importing a
//! configuration, exporting a rendered symbol).

use thiserror::Error;

/// Errors produced at the edges of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A color string was not a valid `#RGB` or `#RRGGBB` hex value.
    #[error("invalid color {0:?}: expected #RGB or #RRGGBB")]
    InvalidColor(String),

    /// No color template is registered under this name.
    #[error("unknown template {0:?}")]
    UnknownTemplate(String),

    /// A download format name was neither `png` nor `svg`.
    #[error("unknown download format {0:?}: expected png or svg")]
    UnknownFormat(String),

    /// A QR type name did not match any known type.
    #[error("unknown QR type {0:?}")]
    UnknownQrType(String),

    /// A logo string was not a base64 `data:` URI.
    #[error("malformed data URI: {0}")]
    InvalidDataUri(&'static str),

    /// The base64 body of a data URI could not be decoded.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Raster bytes could not be decoded or encoded.
    #[error("image codec failure: {0}")]
    Image(#[from] image::ImageError),

    /// The badge SVG could not be rasterized.
    #[error("failed to rasterize badge SVG")]
    Rasterize,

    /// The payload does not fit in any QR symbol version.
    #[error("QR encoding failed: {0}")]
    QrEncode(#[from] qrcode::types::QrError),

    /// Download was requested before any update was applied.
    #[error("nothing has been rendered yet")]
    NothingRendered,

    /// A configuration could not be serialized or parsed.
    #[error("configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
