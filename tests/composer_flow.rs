//! End-to-end flows through the composer and the in-process renderer.

use image::{Rgba, RgbaImage};
use qr_composer::{
    Color, Composer, ContactRecord, DownloadFormat, Encryption, Error, ImageSource, LogoAsset,
    QrConfig, QrRenderer, QrType, RenderState, Template, WifiCredentials, badge_region,
    encode_png_data_uri, logo_region,
};

fn red_logo() -> LogoAsset {
    let img = RgbaImage::from_pixel(64, 64, Rgba([220, 20, 20, 255]));
    LogoAsset::from_data_uri(encode_png_data_uri(&img).unwrap())
}

#[test]
fn wifi_session_exports_png() {
    let mut composer = Composer::new(QrRenderer::new(), QrConfig::default());
    composer.set_qr_type(QrType::Wifi);
    composer.set_wifi(WifiCredentials::new("Cafe", "latte123", Encryption::Wep));
    composer.set_size(200);

    let shown = composer.renderer().current().unwrap();
    assert_eq!(shown.content, "WIFI:T:WEP;S:Cafe;P:latte123;;");
    assert_eq!(shown.width, 200);

    composer.download(DownloadFormat::Png).unwrap();
    let file = composer.renderer_mut().take_downloads().remove(0);
    assert_eq!(file.file_name(), "qr-code.png");
    let decoded = image::load_from_memory(&file.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 200));
}

#[test]
fn contact_with_template_and_badge() {
    let mut composer = Composer::new(QrRenderer::new(), QrConfig::default());
    composer.set_qr_type(QrType::Contact);
    composer.set_contact(ContactRecord::new("Ana", "555-0100", "ana@example.com", "Acme"));
    composer.apply_template("nature").unwrap();
    composer.set_show_badge(true);

    let config = composer.config();
    assert_eq!(
        (config.visual.dot_color, config.visual.background_color),
        Template::Nature.colors()
    );

    let shown = composer.last_applied().unwrap();
    assert_eq!(
        shown.content,
        "BEGIN:VCARD\nVERSION:3.0\nFN:Ana\nTEL:555-0100\nEMAIL:ana@example.com\nORG:Acme\nEND:VCARD"
    );
    let badge = shown.image.as_ref().and_then(ImageSource::as_pixels).unwrap();
    assert_eq!(badge.dimensions(), (40, 40));

    composer.download(DownloadFormat::Svg).unwrap();
    let file = composer.renderer_mut().take_downloads().remove(0);
    let svg = String::from_utf8(file.bytes).unwrap();
    assert!(svg.contains(&Template::Nature.colors().0.to_hex()));
    assert!(svg.contains("<image"));
}

#[test]
fn unknown_template_is_reported() {
    let mut composer = Composer::new(QrRenderer::new(), QrConfig::default());
    let before = composer.config().clone();
    assert!(matches!(
        composer.apply_template("sunset"),
        Err(Error::UnknownTemplate(name)) if name == "sunset"
    ));
    assert_eq!(composer.config(), &before);
}

#[test]
fn rejected_payload_keeps_previous_symbol() {
    let mut composer = Composer::new(QrRenderer::new(), QrConfig::default());
    composer.set_text("x".repeat(10_000));
    composer.set_qr_type(QrType::Text);

    // The config moves on but the renderer still shows the last good symbol.
    assert_eq!(composer.config().text.len(), 10_000);
    assert_eq!(composer.renderer().current().unwrap().content, "https://miweb.com");
    assert!(composer.download(DownloadFormat::Png).is_ok());
}

#[test]
fn config_round_trips_through_json() {
    let mut config = QrConfig::default();
    config.qr_type = QrType::Text;
    config.text = "hola".into();
    config.visual.dot_color = Color::rgb(0x8B, 0x5C, 0xF6);
    config.show_badge = true;

    let json = config.to_json().unwrap();
    assert!(json.contains(r#""qrType":"text""#));
    assert!(json.contains(r##""dotColor":"#8B5CF6""##));

    let composer = Composer::new(QrRenderer::new(), QrConfig::from_json(&json).unwrap());
    assert_eq!(composer.last_applied().unwrap().content, "hola");
}

#[tokio::test]
async fn logo_with_badge_settles_to_composite() {
    let mut composer = Composer::new(QrRenderer::new(), QrConfig::default());
    composer.set_logo(Some(red_logo()));
    composer.set_show_badge(true);
    assert_eq!(composer.state(), RenderState::Recomputing);

    composer.settle().await;
    assert_eq!(composer.state(), RenderState::Idle);

    let shown = composer.last_applied().unwrap();
    let image = shown.image.as_ref().and_then(ImageSource::as_pixels).unwrap();
    assert_eq!(image.dimensions(), (300, 300));

    let logo = logo_region();
    let inside = image.get_pixel(logo.x + 10, logo.y + 10);
    assert!(inside[0] > 200 && inside[1] < 40 && inside[3] == 255, "logo: {inside:?}");

    let badge = badge_region();
    let center = image.get_pixel(badge.x + badge.width / 2, badge.y + 8);
    assert!(center[0] > 240 && center[1] > 240, "badge disc over logo: {center:?}");

    assert!(image.get_pixel(5, 5)[3] == 0, "canvas margin stays transparent");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rapid_edits_settle_on_latest() {
    let mut config = QrConfig::default();
    config.logo = Some(red_logo());
    config.show_badge = true;
    let mut composer = Composer::new(QrRenderer::new(), config);

    for i in 0..5 {
        composer.set_url(format!("https://example.com/{i}"));
    }
    composer.settle().await;

    let shown = composer.last_applied().unwrap();
    assert_eq!(shown.content, "https://example.com/4");
    assert_eq!(composer.renderer().current(), Some(shown));
}

#[tokio::test]
async fn sync_edit_wins_over_pending_composite() {
    let mut config = QrConfig::default();
    config.show_badge = true;
    let mut composer = Composer::new(QrRenderer::new(), config);

    composer.set_logo(Some(red_logo()));
    composer.set_show_badge(false);
    let latest = composer.last_applied().unwrap().clone();
    assert_eq!(
        latest.image,
        Some(ImageSource::DataUri(red_logo().as_data_uri().to_string()))
    );

    composer.settle().await;
    assert_eq!(composer.last_applied(), Some(&latest));
    assert_eq!(composer.poll(), 0);
}

#[tokio::test]
async fn undecodable_logo_drops_badge() {
    let broken = LogoAsset::from_data_uri("data:image/png;base64,bm90IGEgcG5n");
    let mut composer = Composer::new(QrRenderer::new(), QrConfig::default());
    composer.set_show_badge(true);
    composer.set_logo(Some(broken.clone()));
    composer.settle().await;

    let shown = composer.last_applied().unwrap();
    assert_eq!(
        shown.image,
        Some(ImageSource::DataUri(broken.as_data_uri().to_string()))
    );
    assert!(shown.image_options.hide_background_dots);
    assert_eq!(shown.image_options.image_size, 0.5);

    // The renderer cannot draw the logo either, but still shows the symbol.
    composer.download(DownloadFormat::Png).unwrap();
    assert_eq!(composer.renderer_mut().take_downloads().len(), 1);
}
