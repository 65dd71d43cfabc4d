//! The privileged context: capture primitive, downloader, settings access.
//!
//! In the browser these handlers sit in the background service worker; here
//! they are registered on the privileged endpoint, with the platform screen
//! API replaced by a [`ScreenSource`] seam.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use clip_bus::registry::MessageHandler;
use clip_bus::{Endpoint, ErrorBody, MessageKind, Request, Response, errors as bus_errors};
use clip_core::filename::{FilenameSuffix, save_filename};
use clip_core::ids::DownloadId;
use clip_settings::SettingsStore;

/// The capture primitive: produces the raw viewport image.
pub trait ScreenSource: Send + Sync {
    /// Grab the current viewport as PNG bytes.
    fn capture_viewport(&self) -> std::io::Result<Vec<u8>>;
}

/// A screen source that replays a PNG file as "the screen".
pub struct FileScreenSource {
    path: PathBuf,
}

impl FileScreenSource {
    /// Use the image at `path` as the viewport.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScreenSource for FileScreenSource {
    fn capture_viewport(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// Register every privileged handler on the endpoint.
pub fn attach(
    endpoint: &Endpoint,
    source: Arc<dyn ScreenSource>,
    out_dir: PathBuf,
    store: Arc<SettingsStore>,
) {
    let registry = endpoint.registry();
    registry.register(MessageKind::Ping, PingHandler);
    registry.register(MessageKind::CaptureScreenshot, CaptureHandler { source });
    registry.register(
        MessageKind::SaveScreenshot,
        SaveHandler {
            out_dir: out_dir.clone(),
        },
    );
    registry.register(MessageKind::SaveJourneyCollection, JourneyHandler { out_dir });
    registry.register(
        MessageKind::GetSettings,
        GetSettingsHandler {
            store: store.clone(),
        },
    );
    registry.register(MessageKind::UpdateSettings, UpdateSettingsHandler { store });
}

/// Answers `PING` so the page side can probe privileged liveness.
struct PingHandler;

#[async_trait]
impl MessageHandler for PingHandler {
    async fn handle(&self, _request: Request) -> Result<Response, ErrorBody> {
        Ok(Response::pong_now())
    }
}

/// `CAPTURE_SCREENSHOT`: the raw image, uncomposited.
struct CaptureHandler {
    source: Arc<dyn ScreenSource>,
}

#[async_trait]
impl MessageHandler for CaptureHandler {
    async fn handle(&self, _request: Request) -> Result<Response, ErrorBody> {
        let image_data = self
            .source
            .capture_viewport()
            .map_err(|e| ErrorBody::new(bus_errors::CAPTURE_FAILED, e.to_string()))?;
        debug!(bytes = image_data.len(), "viewport captured");
        Ok(Response::Screenshot { image_data })
    }
}

/// `SAVE_SCREENSHOT`: write one composited capture under the filename
/// convention.
struct SaveHandler {
    out_dir: PathBuf,
}

#[async_trait]
impl MessageHandler for SaveHandler {
    async fn handle(&self, request: Request) -> Result<Response, ErrorBody> {
        let Request::SaveScreenshot(params) = request else {
            return Err(ErrorBody::new(
                bus_errors::INVALID_PARAMS,
                "wrong request shape for SAVE_SCREENSHOT",
            ));
        };
        let suffix = if params.transcript_text.is_some() {
            FilenameSuffix::Transcribed
        } else if params.annotation_text.is_some() {
            FilenameSuffix::Annotated
        } else {
            FilenameSuffix::None
        };
        let name = save_filename(&params.source_url, params.timestamp, suffix);
        write_file(&self.out_dir, &name, &params.image_data)?;
        info!(file = %name, "capture saved");
        Ok(Response::Saved {
            download_id: DownloadId::new(),
        })
    }
}

/// `SAVE_JOURNEY_COLLECTION`: one file per entry, in collection order.
struct JourneyHandler {
    out_dir: PathBuf,
}

#[async_trait]
impl MessageHandler for JourneyHandler {
    async fn handle(&self, request: Request) -> Result<Response, ErrorBody> {
        let Request::SaveJourneyCollection(params) = request else {
            return Err(ErrorBody::new(
                bus_errors::INVALID_PARAMS,
                "wrong request shape for SAVE_JOURNEY_COLLECTION",
            ));
        };
        let mut download_ids = Vec::with_capacity(params.entries.len());
        for entry in &params.entries {
            let name = save_filename(
                &entry.source_url,
                entry.captured_at,
                FilenameSuffix::Journey(entry.ordinal),
            );
            write_file(&self.out_dir, &name, &entry.image_data)?;
            download_ids.push(DownloadId::new());
        }
        info!(entries = download_ids.len(), "journey collection saved");
        Ok(Response::JourneySaved {
            saved: download_ids.len() as u32,
            download_ids,
        })
    }
}

/// `GET_SETTINGS`: the current settings namespace.
struct GetSettingsHandler {
    store: Arc<SettingsStore>,
}

#[async_trait]
impl MessageHandler for GetSettingsHandler {
    async fn handle(&self, _request: Request) -> Result<Response, ErrorBody> {
        let snapshot = serde_json::to_value(self.store.settings())
            .map_err(|e| ErrorBody::new(bus_errors::SETTINGS_ERROR, e.to_string()))?;
        Ok(Response::Settings { snapshot })
    }
}

/// `UPDATE_SETTINGS`: deep-merge a patch, reply with the updated document.
struct UpdateSettingsHandler {
    store: Arc<SettingsStore>,
}

#[async_trait]
impl MessageHandler for UpdateSettingsHandler {
    async fn handle(&self, request: Request) -> Result<Response, ErrorBody> {
        let Request::UpdateSettings { patch } = request else {
            return Err(ErrorBody::new(
                bus_errors::INVALID_PARAMS,
                "wrong request shape for UPDATE_SETTINGS",
            ));
        };
        let updated = self
            .store
            .update_settings(patch)
            .map_err(|e| ErrorBody::new(bus_errors::SETTINGS_ERROR, e.to_string()))?;
        let snapshot = serde_json::to_value(updated)
            .map_err(|e| ErrorBody::new(bus_errors::SETTINGS_ERROR, e.to_string()))?;
        Ok(Response::Settings { snapshot })
    }
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), ErrorBody> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ErrorBody::new(bus_errors::SAVE_FAILED, e.to_string()))?;
    std::fs::write(dir.join(name), bytes)
        .map_err(|e| ErrorBody::new(bus_errors::SAVE_FAILED, e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
