//! Command-line front end for qr-composer.
//!
//! Builds one configuration from flags, renders it with the in-process
//! renderer and writes the exported file.
//!
//! Usage:
//!   qr-composer --type wifi --ssid Home --password secret --badge --out ./qr
//!   qr-composer --url https://example.com --template vibrant --format svg

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use image::ImageFormat;
use qr_composer::{
    Color, Composer, ContactRecord, DownloadFormat, Encryption, LogoAsset, QrConfig, QrRenderer,
    QrType, WifiCredentials,
};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "qr-composer")]
#[command(about = "Compose a styled QR code and export it as PNG or SVG")]
struct Args {
    /// Content type: url, wifi, contact or text
    #[arg(short = 't', long = "type", default_value = "url")]
    qr_type: QrType,

    /// URL payload
    #[arg(long, default_value = "https://miweb.com")]
    url: String,

    /// Free text payload
    #[arg(long, default_value = "")]
    text: String,

    /// WiFi network name
    #[arg(long, default_value = "")]
    ssid: String,

    /// WiFi password
    #[arg(long, default_value = "")]
    password: String,

    /// WiFi encryption: wpa, wep or none
    #[arg(long, default_value = "wpa", value_parser = parse_encryption)]
    encryption: Encryption,

    /// Contact name
    #[arg(long, default_value = "")]
    name: String,

    /// Contact phone
    #[arg(long, default_value = "")]
    phone: String,

    /// Contact email
    #[arg(long, default_value = "")]
    email: String,

    /// Contact company
    #[arg(long, default_value = "")]
    company: String,

    /// Dot color (#RRGGBB)
    #[arg(long)]
    dot_color: Option<Color>,

    /// Background color (#RRGGBB)
    #[arg(long)]
    background_color: Option<Color>,

    /// Color template: classic, modern, vibrant or nature
    #[arg(long)]
    template: Option<String>,

    /// Symbol side in pixels (clamped to 150..=500)
    #[arg(short, long, default_value_t = qr_composer::DEFAULT_SIZE_PX)]
    size: u32,

    /// Logo image to place in the center
    #[arg(short, long)]
    logo: Option<PathBuf>,

    /// Show the content type badge
    #[arg(short, long)]
    badge: bool,

    /// Export format: png or svg
    #[arg(short, long, default_value = "png")]
    format: DownloadFormat,

    /// Directory to write the exported file into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Print the payload and the renderer update instead of only writing the file
    #[arg(long)]
    print: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_encryption(s: &str) -> Result<Encryption, String> {
    match s.to_ascii_lowercase().as_str() {
        "wpa" => Ok(Encryption::Wpa),
        "wep" => Ok(Encryption::Wep),
        "none" | "nopass" => Ok(Encryption::None),
        other => Err(format!("unknown encryption {other:?}")),
    }
}

fn load_logo(path: &Path) -> Result<LogoAsset> {
    let bytes = fs::read(path).with_context(|| format!("reading logo {}", path.display()))?;
    let mime = ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("image/png");
    Ok(LogoAsset::from_bytes(&bytes, mime))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut config = QrConfig {
        qr_type: args.qr_type,
        url: args.url,
        text: args.text,
        wifi: WifiCredentials::new(args.ssid, args.password, args.encryption),
        contact: ContactRecord::new(args.name, args.phone, args.email, args.company),
        show_badge: args.badge,
        ..QrConfig::default()
    };
    config.visual.set_size_px(args.size);
    if let Some(path) = &args.logo {
        config.logo = Some(load_logo(path)?);
    }

    let mut composer = Composer::new(QrRenderer::new(), config);
    if let Some(name) = &args.template {
        composer.apply_template(name)?;
    }
    if let Some(color) = args.dot_color {
        composer.set_dot_color(color);
    }
    if let Some(color) = args.background_color {
        composer.set_background_color(color);
    }
    composer.settle().await;

    let update = composer
        .last_applied()
        .context("the renderer rejected the configuration")?;
    if args.print {
        println!("{}", update.content);
        println!("{}", serde_json::to_string_pretty(update)?);
    }

    composer.download(args.format)?;
    fs::create_dir_all(&args.out)?;
    for file in composer.renderer_mut().take_downloads() {
        let path = args.out.join(file.file_name());
        fs::write(&path, &file.bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), bytes = file.bytes.len(), "exported");
    }

    Ok(())
}
