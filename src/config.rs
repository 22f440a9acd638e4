//! Session configuration and color templates.
//!
//! [`QrConfig`] holds every value the caller can edit. It serializes to
//! camelCase JSON so a front end can hand a whole form state over at once.
//!
//! # Example
//!
//! ```
//! use qr_composer::{QrConfig, QrType, Template};
//!
//! let mut config = QrConfig::default();
//! config.qr_type = QrType::Text;
//! config.text = "hello".into();
//! config.visual.apply_template(Template::Vibrant);
//!
//! let json = config.to_json().unwrap();
//! let restored = QrConfig::from_json(&json).unwrap();
//! assert_eq!(restored, config);
//! ```

use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::payload::{self, ContactRecord, QrType, WifiCredentials};
use crate::raster::LogoAsset;

/// Smallest symbol side accepted, in pixels.
pub const MIN_SIZE_PX: u32 = 150;

/// Largest symbol side accepted, in pixels.
pub const MAX_SIZE_PX: u32 = 500;

/// Symbol side used when nothing else is set.
pub const DEFAULT_SIZE_PX: u32 = 300;

// ============================================================================
// Color
// ============================================================================

/// An opaque sRGB color, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(Srgb<u8>);

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(Srgb::new(r, g, b))
    }

    /// Parses `#RGB` or `#RRGGBB`; the leading `#` is optional.
    /// Parses `#RRGGBB` or `#RGB`, with or without the leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        Srgb::<u8>::from_str(hex.trim())
            .map(Self)
            .map_err(|_| Error::InvalidColor(hex.to_string()))
    }

    /// Formats as uppercase `#RRGGBB`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0.red, self.0.green, self.0.blue)
    }

    /// Returns the color as an opaque RGBA quadruple.
    pub fn rgba(&self) -> [u8; 4] {
        [self.0.red, self.0.green, self.0.blue, 255]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

// ============================================================================
// Template
// ============================================================================

/// Named dot/background color pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Classic,
    Modern,
    Vibrant,
    Nature,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Classic,
        Template::Modern,
        Template::Vibrant,
        Template::Nature,
    ];

    /// The lowercase name templates are looked up by.
    pub fn name(&self) -> &'static str {
        match self {
            Template::Classic => "classic",
            Template::Modern => "modern",
            Template::Vibrant => "vibrant",
            Template::Nature => "nature",
        }
    }

    /// Returns `(dot color, background color)`.
    pub fn colors(&self) -> (Color, Color) {
        match self {
            Template::Classic => (Color::BLACK, Color::WHITE),
            Template::Modern => (Color::rgb(0x3B, 0x82, 0xF6), Color::rgb(0xF8, 0xFA, 0xFC)),
            Template::Vibrant => (Color::rgb(0xF5, 0x9E, 0x0B), Color::rgb(0x1F, 0x29, 0x37)),
            Template::Nature => (Color::rgb(0x10, 0xB9, 0x81), Color::rgb(0xF0, 0xFD, 0xF4)),
        }
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::UnknownTemplate(s.to_string()))
    }
}

// ============================================================================
// VisualConfig
// ============================================================================

/// Colors and size of the rendered symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualConfig {
    pub dot_color: Color,
    pub background_color: Color,
    #[serde(deserialize_with = "deserialize_size")]
    size_px: u32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            dot_color: Color::BLACK,
            background_color: Color::WHITE,
            size_px: DEFAULT_SIZE_PX,
        }
    }
}

impl VisualConfig {
    /// Creates a visual config, clamping `size_px`.
    pub fn new(dot_color: Color, background_color: Color, size_px: u32) -> Self {
        Self {
            dot_color,
            background_color,
            size_px: clamp_size(size_px),
        }
    }

    /// Symbol side in pixels, always within bounds.
    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    /// Sets the symbol side, clamped to [`MIN_SIZE_PX`]..=[`MAX_SIZE_PX`].
    pub fn set_size_px(&mut self, size_px: u32) {
        self.size_px = clamp_size(size_px);
    }

    /// Replaces both colors with the template's pair.
    pub fn apply_template(&mut self, template: Template) {
        let (dot, background) = template.colors();
        self.dot_color = dot;
        self.background_color = background;
    }
}

/// Clamps a requested symbol side to [`MIN_SIZE_PX`]..=[`MAX_SIZE_PX`].
pub fn clamp_size(size_px: u32) -> u32 {
    size_px.clamp(MIN_SIZE_PX, MAX_SIZE_PX)
}

fn deserialize_size<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    u32::deserialize(deserializer).map(clamp_size)
}

// ============================================================================
// QrConfig
// ============================================================================

/// Everything the caller can edit for one QR code.
///
/// # JSON Format
///
/// ```json
/// {
///   "qrType": "wifi",
///   "url": "https://miweb.com",
///   "text": "",
///   "wifi": { "ssid": "Home", "password": "secret", "encryption": "WPA" },
///   "contact": { "name": "", "phone": "", "email": "", "company": "" },
///   "visual": { "dotColor": "#000000", "backgroundColor": "#FFFFFF", "sizePx": 300 },
///   "logo": null,
///   "showBadge": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QrConfig {
    pub qr_type: QrType,
    pub url: String,
    pub text: String,
    pub wifi: WifiCredentials,
    pub contact: ContactRecord,
    pub visual: VisualConfig,
    pub logo: Option<LogoAsset>,
    pub show_badge: bool,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            qr_type: QrType::Url,
            url: "https://miweb.com".to_string(),
            text: String::new(),
            wifi: WifiCredentials::default(),
            contact: ContactRecord::default(),
            visual: VisualConfig::default(),
            logo: None,
            show_badge: false,
        }
    }
}

impl QrConfig {
    /// Default session: a URL code for `https://miweb.com`, black on white, 300px.
    pub fn new() -> Self {
        Self::default()
    }

    /// The string to encode for the active type.
    pub fn payload(&self) -> String {
        payload::encode(self.qr_type, &self.url, &self.text, &self.wifi, &self.contact)
    }

    /// Serializes to compact camelCase JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes to indented camelCase JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a configuration. Missing fields take their defaults and the size is clamped.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Encryption;

    #[test]
    fn color_hex_forms() {
        assert_eq!(Color::from_hex("#F59E0B").unwrap(), Color::rgb(0xF5, 0x9E, 0x0B));
        assert_eq!(Color::from_hex("f59e0b").unwrap(), Color::rgb(0xF5, 0x9E, 0x0B));
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::rgb(0x1F, 0x29, 0x37).to_hex(), "#1F2937");
        assert!(matches!(Color::from_hex("#12345"), Err(Error::InvalidColor(_))));
        assert!(Color::from_hex("blue").is_err());
    }

    #[test]
    fn templates_lookup() {
        let (dot, bg) = "vibrant".parse::<Template>().unwrap().colors();
        assert_eq!(dot.to_hex(), "#F59E0B");
        assert_eq!(bg.to_hex(), "#1F2937");

        let (dot, bg) = Template::Modern.colors();
        assert_eq!((dot.to_hex().as_str(), bg.to_hex().as_str()), ("#3B82F6", "#F8FAFC"));

        let (dot, bg) = Template::Nature.colors();
        assert_eq!((dot.to_hex().as_str(), bg.to_hex().as_str()), ("#10B981", "#F0FDF4"));

        assert_eq!(Template::Classic.colors(), (Color::BLACK, Color::WHITE));
        assert!(matches!("neon".parse::<Template>(), Err(Error::UnknownTemplate(_))));
    }

    #[test]
    fn size_is_clamped() {
        let mut visual = VisualConfig::default();
        visual.set_size_px(20);
        assert_eq!(visual.size_px(), MIN_SIZE_PX);
        visual.set_size_px(9000);
        assert_eq!(visual.size_px(), MAX_SIZE_PX);
        visual.set_size_px(320);
        assert_eq!(visual.size_px(), 320);

        assert_eq!(VisualConfig::new(Color::BLACK, Color::WHITE, 0).size_px(), MIN_SIZE_PX);
    }

    #[test]
    fn deserialized_size_is_clamped() {
        let config = QrConfig::from_json(r#"{"visual":{"sizePx":1000}}"#).unwrap();
        assert_eq!(config.visual.size_px(), MAX_SIZE_PX);
    }

    #[test]
    fn payload_follows_active_type() {
        let mut config = QrConfig::default();
        config.wifi = WifiCredentials::new("Home", "secret", Encryption::Wpa);
        assert_eq!(config.payload(), "https://miweb.com");

        config.qr_type = QrType::Wifi;
        assert_eq!(config.payload(), "WIFI:T:WPA;S:Home;P:secret;;");
    }

    #[test]
    fn config_json_format() {
        let mut config = QrConfig::default();
        config.visual.apply_template(Template::Vibrant);
        let json = config.to_json_pretty().unwrap();

        assert!(json.contains("\"qrType\": \"url\""));
        assert!(json.contains("\"dotColor\": \"#F59E0B\""));
        assert!(json.contains("\"showBadge\": false"));
    }

    #[test]
    fn config_json_restores() {
        let mut config = QrConfig::default();
        config.qr_type = QrType::Contact;
        config.contact = ContactRecord::new("Ana", "123", "a@b.com", "Acme");
        config.logo = Some(LogoAsset::from_data_uri("data:image/png;base64,AAAA"));
        config.show_badge = true;

        let restored = QrConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(QrConfig::from_json("{}").unwrap(), QrConfig::default());
    }

    #[test]
    fn bad_color_in_json_is_rejected() {
        let result = QrConfig::from_json(r#"{"visual":{"dotColor":"nope"}}"#);
        assert!(result.is_err());
    }
}
