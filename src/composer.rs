//! Render orchestration.
//!
//! [`Composer`] owns the session [`QrConfig`] and is the single handler
//! notified of every edit. Each effective edit is a trigger: it takes a
//! snapshot, encodes the payload, builds the embedded image and pushes one
//! [`RenderUpdate`] to the [`Renderer`].
//!
//! Decoding a logo so a badge can be drawn over it is the only step that
//! runs off the caller's path. Those jobs are tagged with the sequence
//! number of their trigger; when one finishes after a newer trigger has been
//! issued its result is dropped. Nothing is cancelled.
//!
//! # Example
//!
//! ```
//! use qr_composer::{Composer, DownloadFormat, QrConfig, QrRenderer};
//!
//! let mut composer = Composer::new(QrRenderer::new(), QrConfig::default());
//! composer.set_url("https://example.com");
//! composer.apply_template("modern").unwrap();
//! composer.download(DownloadFormat::Svg).unwrap();
//!
//! let file = composer.renderer_mut().take_downloads().pop().unwrap();
//! assert_eq!(file.file_name(), "qr-code.svg");
//! ```

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::badge::{BadgeCache, BadgeSize};
use crate::compose::compose_embedded;
use crate::config::{Color, QrConfig, Template};
use crate::error::{Error, Result};
use crate::payload::{ContactRecord, QrType, WifiCredentials};
use crate::raster::{ImageSource, LogoAsset};

/// File name (without extension) used for every download.
pub const DOWNLOAD_NAME: &str = "qr-code";

// ============================================================================
// Renderer Contract
// ============================================================================

/// How modules are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DotStyle {
    #[default]
    Rounded,
}

/// Color and shape of the dark modules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DotsOptions {
    pub color: Color,
    #[serde(rename = "type")]
    pub style: DotStyle,
}

/// Fill behind the modules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundOptions {
    pub color: Color,
}

/// Placement of the embedded image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    /// Clear space around the image, in pixels.
    pub margin: u32,
    /// Whether modules under the image are left out.
    pub hide_background_dots: bool,
    /// Image side relative to the symbol side.
    pub image_size: f32,
}

impl ImageOptions {
    /// Options for an embedded image that is (or is not) built from a logo.
    pub fn for_image(has_image: bool, has_logo: bool) -> Self {
        Self {
            margin: if has_image { 10 } else { 5 },
            hide_background_dots: has_logo,
            image_size: if has_logo { 0.5 } else { 0.25 },
        }
    }
}

/// One complete update for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderUpdate {
    /// The payload to encode.
    #[serde(rename = "data")]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource>,
    pub dots_options: DotsOptions,
    pub background_options: BackgroundOptions,
    pub image_options: ImageOptions,
    pub width: u32,
    pub height: u32,
}

impl RenderUpdate {
    /// Assembles the update for `config`, given its payload and embedded image.
    pub fn new(config: &QrConfig, content: String, image: Option<ImageSource>) -> Self {
        let size = config.visual.size_px();
        Self {
            content,
            image_options: ImageOptions::for_image(image.is_some(), config.logo.is_some()),
            image,
            dots_options: DotsOptions {
                color: config.visual.dot_color,
                style: DotStyle::Rounded,
            },
            background_options: BackgroundOptions {
                color: config.visual.background_color,
            },
            width: size,
            height: size,
        }
    }

    /// The update as the JSON object a web QR widget accepts.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Export format for downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    #[default]
    Png,
    Svg,
}

impl DownloadFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadFormat::Png => "png",
            DownloadFormat::Svg => "svg",
        }
    }
}

impl std::str::FromStr for DownloadFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(DownloadFormat::Png),
            "svg" => Ok(DownloadFormat::Svg),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// A request to export the currently displayed symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub filename: String,
    pub format: DownloadFormat,
}

/// The component that turns updates into a displayed, exportable symbol.
pub trait Renderer {
    /// Replaces everything currently displayed with `update`.
    fn update(&mut self, update: &RenderUpdate) -> Result<()>;

    /// Exports the symbol from the last successful update.
    fn download(&mut self, request: &DownloadRequest) -> Result<()>;
}

// ============================================================================
// Composer
// ============================================================================

/// Whether an asynchronous composite for the latest snapshot is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Recomputing,
}

/// Result of a decode-and-draw job, tagged with its trigger.
struct Finished {
    seq: u64,
    update: RenderUpdate,
}

/// Reports one decode-and-draw job back to its composer exactly once.
///
/// A job whose task is dropped before it finishes (its runtime shut down,
/// for instance) still reports: dropping the report delivers the logo-only
/// fallback, so `settle` and `state` never wait on a job that cannot end.
struct JobReport {
    seq: u64,
    fallback: Option<RenderUpdate>,
    done_tx: mpsc::UnboundedSender<Finished>,
}

impl JobReport {
    fn send(&mut self, update: RenderUpdate) {
        self.fallback = None;
        if self.done_tx.send(Finished { seq: self.seq, update }).is_err() {
            debug!(seq = self.seq, "composer dropped, discarding composite");
        }
    }
}

impl Drop for JobReport {
    fn drop(&mut self) {
        if let Some(update) = self.fallback.take() {
            warn!(seq = self.seq, "composite job ended without a result, embedding logo without badge");
            self.send(update);
        }
    }
}

/// Drives a [`Renderer`] from configuration edits.
pub struct Composer<R: Renderer> {
    renderer: R,
    config: QrConfig,
    badges: BadgeCache,

    /// Sequence number of the latest trigger.
    seq: u64,
    /// Sequence number of a job still computing the latest trigger, if any.
    pending: Option<u64>,
    in_flight: usize,
    applied: Option<RenderUpdate>,

    done_tx: mpsc::UnboundedSender<Finished>,
    done_rx: mpsc::UnboundedReceiver<Finished>,
}

impl<R: Renderer> Composer<R> {
    /// Creates a composer and pushes `config` to the renderer right away.
    pub fn new(renderer: R, config: QrConfig) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let mut composer = Self {
            renderer,
            config,
            badges: BadgeCache::new(),
            seq: 0,
            pending: None,
            in_flight: 0,
            applied: None,
            done_tx,
            done_rx,
        };
        composer.recompute();
        composer
    }

    /// The current configuration, including edits still being composited.
    pub fn config(&self) -> &QrConfig {
        &self.config
    }

    /// The driven renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the renderer, e.g. to drain exported files.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Consumes the composer, returning the renderer.
    ///
    /// Composites still in flight are abandoned.
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// The last update the renderer accepted.
    pub fn last_applied(&self) -> Option<&RenderUpdate> {
        self.applied.as_ref()
    }

    /// Sequence number of the most recent trigger.
    pub fn latest_seq(&self) -> u64 {
        self.seq
    }

    /// Whether the latest trigger is still waiting on a composite.
    pub fn state(&self) -> RenderState {
        if self.pending == Some(self.seq) {
            RenderState::Recomputing
        } else {
            RenderState::Idle
        }
    }

    // ---- Edits ----

    /// Mutates the configuration and triggers a recompute if anything changed.
    ///
    /// Returns true if a recompute was triggered.
    pub fn edit(&mut self, f: impl FnOnce(&mut QrConfig)) -> bool {
        let before = self.config.clone();
        f(&mut self.config);
        if self.config == before {
            return false;
        }
        self.recompute();
        true
    }

    /// Replaces the whole configuration.
    pub fn replace(&mut self, config: QrConfig) -> bool {
        self.edit(|c| *c = config)
    }

    /// Switches the content type. The payload and badge glyph follow it.
    pub fn set_qr_type(&mut self, qr_type: QrType) -> bool {
        self.edit(|c| c.qr_type = qr_type)
    }

    /// Sets the URL used while the type is [`QrType::Url`].
    pub fn set_url(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        self.edit(|c| c.url = url)
    }

    /// Sets the free text used while the type is [`QrType::Text`].
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.edit(|c| c.text = text)
    }

    /// Sets the network used while the type is [`QrType::Wifi`].
    pub fn set_wifi(&mut self, wifi: WifiCredentials) -> bool {
        self.edit(|c| c.wifi = wifi)
    }

    /// Sets the card used while the type is [`QrType::Contact`].
    pub fn set_contact(&mut self, contact: ContactRecord) -> bool {
        self.edit(|c| c.contact = contact)
    }

    /// Sets the module color.
    pub fn set_dot_color(&mut self, color: Color) -> bool {
        self.edit(|c| c.visual.dot_color = color)
    }

    /// Sets the background color.
    pub fn set_background_color(&mut self, color: Color) -> bool {
        self.edit(|c| c.visual.background_color = color)
    }

    /// Sets the symbol side; out-of-range values are clamped.
    pub fn set_size(&mut self, size_px: u32) -> bool {
        self.edit(|c| c.visual.set_size_px(size_px))
    }

    /// Sets or clears the center logo.
    ///
    /// With the badge on, a logo makes the next composite asynchronous.
    pub fn set_logo(&mut self, logo: Option<LogoAsset>) -> bool {
        self.edit(|c| c.logo = logo)
    }

    /// Turns the content type badge on or off.
    pub fn set_show_badge(&mut self, show: bool) -> bool {
        self.edit(|c| c.show_badge = show)
    }

    /// Applies a named color template in a single edit.
    pub fn apply_template(&mut self, name: &str) -> Result<bool> {
        let template: Template = name.parse()?;
        Ok(self.edit(|c| c.visual.apply_template(template)))
    }

    // ---- Recompute ----

    fn recompute(&mut self) {
        self.seq += 1;
        let seq = self.seq;
        let snapshot = self.config.clone();
        let content = snapshot.payload();
        debug!(seq, qr_type = %snapshot.qr_type, "recomputing");

        match (snapshot.logo.clone(), snapshot.show_badge) {
            (Some(logo), true) => {
                let Some(badge) = self.badges.get(snapshot.qr_type, BadgeSize::Large) else {
                    let image = ImageSource::DataUri(logo.as_data_uri().to_string());
                    self.apply(seq, RenderUpdate::new(&snapshot, content, Some(image)));
                    return;
                };
                match Handle::try_current() {
                    Ok(handle) => self.spawn_composite(&handle, seq, snapshot, content, logo, badge),
                    Err(_) => {
                        let image = compose_embedded(Some(&logo), Some(badge));
                        self.apply(seq, RenderUpdate::new(&snapshot, content, image));
                    }
                }
            }
            (logo, show) => {
                let badge = if show {
                    self.badges.get(snapshot.qr_type, BadgeSize::Default)
                } else {
                    None
                };
                let image = compose_embedded(logo.as_ref(), badge);
                self.apply(seq, RenderUpdate::new(&snapshot, content, image));
            }
        }
    }

    fn spawn_composite(
        &mut self,
        handle: &Handle,
        seq: u64,
        snapshot: QrConfig,
        content: String,
        logo: LogoAsset,
        badge: image::RgbaImage,
    ) {
        self.pending = Some(seq);
        self.in_flight += 1;

        let fallback_image = ImageSource::DataUri(logo.as_data_uri().to_string());
        let mut report = JobReport {
            seq,
            fallback: Some(RenderUpdate::new(&snapshot, content.clone(), Some(fallback_image))),
            done_tx: self.done_tx.clone(),
        };

        handle.spawn(async move {
            let job = tokio::task::spawn_blocking(move || compose_embedded(Some(&logo), Some(badge)));
            match job.await {
                Ok(image) => report.send(RenderUpdate::new(&snapshot, content, image)),
                // Dropping the report delivers the fallback.
                Err(err) => warn!(seq, error = %err, "composite job failed"),
            }
        });
    }

    fn finish(&mut self, done: Finished) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.pending == Some(done.seq) {
            self.pending = None;
        }
        self.apply(done.seq, done.update);
    }

    fn apply(&mut self, seq: u64, update: RenderUpdate) {
        if seq != self.seq {
            debug!(seq, latest = self.seq, "discarding stale composite");
            return;
        }
        match self.renderer.update(&update) {
            Ok(()) => self.applied = Some(update),
            Err(err) => warn!(seq, error = %err, "renderer rejected update"),
        }
    }

    /// Applies any finished composites without waiting.
    ///
    /// Returns the number of results received (applied or discarded).
    pub fn poll(&mut self) -> usize {
        let mut received = 0;
        while let Ok(done) = self.done_rx.try_recv() {
            self.finish(done);
            received += 1;
        }
        received
    }

    /// Waits for every outstanding composite and applies the latest.
    ///
    /// Every job reports exactly once, even when its task is dropped, so
    /// this returns as soon as all of them have.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.done_rx.recv().await {
                Some(done) => self.finish(done),
                None => break,
            }
        }
    }

    // ---- Download ----

    /// Asks the renderer to export the currently applied symbol.
    ///
    /// Finished composites are applied first; ones still running are not
    /// waited for.
    pub fn download(&mut self, format: DownloadFormat) -> Result<()> {
        self.poll();
        let request = DownloadRequest {
            filename: DOWNLOAD_NAME.to_string(),
            format,
        };
        debug!(format = format.extension(), "download requested");
        self.renderer.download(&request)
    }
}

// ============================================================================
// Tests
// ============================================================================
