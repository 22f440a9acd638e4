//! Payload encoding: structured input to the exact string stored in the symbol.
//!
//! Builders insert caller values positionally and never escape them. A `;`
//! inside an SSID, for example, ends up verbatim in the `WIFI:` record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// QrType
// ============================================================================

/// The kind of content a QR code carries.
///
/// Selects which fields feed the payload and which glyph the badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrType {
    #[default]
    Url,
    Wifi,
    Contact,
    Text,
}

impl QrType {
    /// All types, in display order.
    pub const ALL: [QrType; 4] = [QrType::Url, QrType::Wifi, QrType::Contact, QrType::Text];

    pub fn as_str(&self) -> &'static str {
        match self {
            QrType::Url => "url",
            QrType::Wifi => "wifi",
            QrType::Contact => "contact",
            QrType::Text => "text",
        }
    }
}

impl fmt::Display for QrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QrType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownQrType(s.to_string()))
    }
}

// ============================================================================
// WiFi
// ============================================================================

/// WiFi authentication scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Encryption {
    #[default]
    Wpa,
    Wep,
    None,
}

impl Encryption {
    /// The token written after `T:` in a `WIFI:` record.
    pub fn token(&self) -> &'static str {
        match self {
            Encryption::Wpa => "WPA",
            Encryption::Wep => "WEP",
            Encryption::None => "nopass",
        }
    }
}

/// Network credentials for a `WIFI:` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
    pub encryption: Encryption,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>, encryption: Encryption) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
            encryption,
        }
    }
}

// ============================================================================
// Contact
// ============================================================================

/// A contact card. Every field may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactRecord {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub company: String,
}

impl ContactRecord {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            company: company.into(),
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Builds the payload string for the active type.
///
/// Only the fields belonging to `qr_type` are read: `url` for
/// [`QrType::Url`], `text` for [`QrType::Text`], and so on.
pub fn encode(
    qr_type: QrType,
    url: &str,
    text: &str,
    wifi: &WifiCredentials,
    contact: &ContactRecord,
) -> String {
    match qr_type {
        QrType::Url => url.to_string(),
        QrType::Text => text.to_string(),
        QrType::Wifi => encode_wifi(wifi),
        QrType::Contact => encode_vcard(contact),
    }
}

/// `WIFI:T:<enc>;S:<ssid>;P:<password>;;`
pub fn encode_wifi(wifi: &WifiCredentials) -> String {
    format!(
        "WIFI:T:{};S:{};P:{};;",
        wifi.encryption.token(),
        wifi.ssid,
        wifi.password
    )
}

/// A vCard 3.0 document with one line per field, joined by `\n`.
pub fn encode_vcard(contact: &ContactRecord) -> String {
    [
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{}", contact.name),
        format!("TEL:{}", contact.phone),
        format!("EMAIL:{}", contact.email),
        format!("ORG:{}", contact.company),
        "END:VCARD".to_string(),
    ]
    .join("\n")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_only(qr_type: QrType) -> String {
        encode(
            qr_type,
            "https://example.com/a?b=c",
            "hello; world",
            &WifiCredentials::new("Home", "secret", Encryption::Wpa),
            &ContactRecord::new("Ana", "123", "a@b.com", "Acme"),
        )
    }

    #[test]
    fn url_and_text_are_verbatim() {
        assert_eq!(encode_only(QrType::Url), "https://example.com/a?b=c");
        assert_eq!(encode_only(QrType::Text), "hello; world");
    }

    #[test]
    fn wifi_record_grammar() {
        assert_eq!(encode_only(QrType::Wifi), "WIFI:T:WPA;S:Home;P:secret;;");

        let wep = WifiCredentials::new("Cafe", "k3y", Encryption::Wep);
        assert_eq!(encode_wifi(&wep), "WIFI:T:WEP;S:Cafe;P:k3y;;");

        let open = WifiCredentials::new("Open", "", Encryption::None);
        assert_eq!(encode_wifi(&open), "WIFI:T:nopass;S:Open;P:;;");
    }

    #[test]
    fn wifi_fields_are_not_escaped() {
        let wifi = WifiCredentials::new("a;b:c,d", "p;w", Encryption::Wpa);
        assert_eq!(encode_wifi(&wifi), "WIFI:T:WPA;S:a;b:c,d;P:p;w;;");
    }

    #[test]
    fn empty_ssid_propagates() {
        let wifi = WifiCredentials::default();
        assert_eq!(encode_wifi(&wifi), "WIFI:T:WPA;S:;P:;;");
    }

    #[test]
    fn contact_vcard_layout() {
        assert_eq!(
            encode_only(QrType::Contact),
            "BEGIN:VCARD\nVERSION:3.0\nFN:Ana\nTEL:123\nEMAIL:a@b.com\nORG:Acme\nEND:VCARD"
        );
    }

    #[test]
    fn empty_contact_keeps_every_line() {
        let vcard = encode_vcard(&ContactRecord::default());
        let lines: Vec<_> = vcard.split('\n').collect();
        assert_eq!(
            lines,
            ["BEGIN:VCARD", "VERSION:3.0", "FN:", "TEL:", "EMAIL:", "ORG:", "END:VCARD"]
        );
    }

    #[test]
    fn encoding_is_idempotent() {
        for qr_type in QrType::ALL {
            assert_eq!(encode_only(qr_type), encode_only(qr_type));
        }
    }

    #[test]
    fn qr_type_parses_case_insensitively() {
        assert_eq!("WiFi".parse::<QrType>().unwrap(), QrType::Wifi);
        assert_eq!("contact".parse::<QrType>().unwrap(), QrType::Contact);
        assert!("sms".parse::<QrType>().is_err());
    }

    #[test]
    fn encryption_serializes_uppercase() {
        let json = serde_json::to_string(&Encryption::None).unwrap();
        assert_eq!(json, "\"NONE\"");
    }
}
