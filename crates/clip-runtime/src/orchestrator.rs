//! The capture orchestrator.
//!
//! Turns a [`CaptureRequest`] into a composited artifact: rate limiter
//! first (rejections cost nothing), then target resolution, then the raw
//! image over the bus, then compositing. Persistence stays on the
//! privileged side, reached via `SAVE_SCREENSHOT` /
//! `SAVE_JOURNEY_COLLECTION`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use clip_bus::{
    BusError, CaptureScreenshotParams, Endpoint, ErrorBody, Request, Response,
    SaveJourneyParams, SaveScreenshotParams, SendOptions, errors as bus_errors,
};
use clip_compose::{CalloutKind, Compositor, MarkerConfig, TextBoxConfig, clamped_anchor};
use clip_core::capture::{CaptureArtifact, CaptureOutcome, CaptureRequest, PageTarget};
use clip_core::geometry::Coordinates;
use clip_core::ids::{CaptureId, DownloadId};
use clip_core::policy::is_restricted_url;
use clip_core::state::Mode;
use clip_settings::SettingsStore;

use crate::errors::CaptureError;
use crate::journey::JourneyCollection;
use crate::limiter::CaptureRateLimiter;

/// Resolves the page a capture would target.
///
/// In the browser this is "the active tab"; the abstraction keeps the
/// orchestrator testable and lets the host decide what a target is.
pub trait TargetResolver: Send + Sync {
    /// The current target, or `None` when there is nothing to capture.
    fn resolve(&self) -> Option<PageTarget>;
}

/// A resolver that always answers with one fixed page.
pub struct FixedTarget(pub PageTarget);

impl TargetResolver for FixedTarget {
    fn resolve(&self) -> Option<PageTarget> {
        Some(self.0.clone())
    }
}

/// Owns the capture variants (plain, annotated, transcribed, journey).
pub struct CaptureOrchestrator {
    endpoint: Arc<Endpoint>,
    limiter: CaptureRateLimiter,
    compositor: Compositor,
    store: Arc<SettingsStore>,
    target: Arc<dyn TargetResolver>,
    journey: Mutex<JourneyCollection>,
}

impl CaptureOrchestrator {
    /// Wire up an orchestrator. The rate limiter interval comes from the
    /// settings store at construction time.
    #[must_use]
    pub fn new(
        endpoint: Arc<Endpoint>,
        compositor: Compositor,
        store: Arc<SettingsStore>,
        target: Arc<dyn TargetResolver>,
    ) -> Self {
        let min_interval = Duration::from_millis(store.settings().capture.min_interval_ms);
        Self {
            endpoint,
            limiter: CaptureRateLimiter::new(min_interval),
            compositor,
            store,
            target,
            journey: Mutex::new(JourneyCollection::new()),
        }
    }

    fn send_options_for(&self, mode: Mode) -> SendOptions {
        let capture = self.store.settings().capture;
        if mode == Mode::Journey {
            SendOptions {
                timeout: Duration::from_millis(capture.journey_timeout_ms),
                retries: 0,
            }
        } else {
            SendOptions {
                timeout: Duration::from_millis(capture.interactive_timeout_ms),
                retries: capture.interactive_retries,
            }
        }
    }

    /// Run one capture attempt end to end (without persistence).
    #[instrument(skip(self, request), fields(mode = %request.mode))]
    pub async fn capture(
        &self,
        request: CaptureRequest,
    ) -> Result<CaptureOutcome, CaptureError> {
        // Rate limiter first: a rejected attempt must cost nothing, and
        // the check-and-update holds no suspension point.
        if !self.limiter.try_acquire_now() {
            debug!("capture rate limited");
            return Ok(CaptureOutcome::RateLimited);
        }

        let Some(target) = self.target.resolve() else {
            return Err(CaptureError::NoTarget);
        };
        if is_restricted_url(&target.url) {
            return Err(CaptureError::RestrictedPage { url: target.url });
        }

        let params = CaptureScreenshotParams {
            coordinates: request.coordinates,
            icon_variant: request.icon_variant,
            annotation_text: request.annotation_text.clone(),
            transcript_text: request.transcript_text.clone(),
            mode: Some(request.mode),
        };
        let options = self.send_options_for(request.mode);
        let response = self
            .endpoint
            .send(Request::CaptureScreenshot(params), options)
            .await?;
        let Response::Screenshot { image_data } = response else {
            return Err(CaptureError::Bus(BusError::Remote(ErrorBody::new(
                bus_errors::INTERNAL_ERROR,
                "capture reply had the wrong shape",
            ))));
        };

        let artifact = self.composite(image_data, &request, &target);
        Ok(CaptureOutcome::Captured(Box::new(artifact)))
    }

    /// Composite the marker (and callout) over the raw image.
    ///
    /// Pure except for the icon load inside the engine; a request without
    /// coordinates passes the raw image through untouched.
    fn composite(
        &self,
        raw_png: Vec<u8>,
        request: &CaptureRequest,
        target: &PageTarget,
    ) -> CaptureArtifact {
        let captured_at = Utc::now();
        let image_data = match request.coordinates {
            None => raw_png,
            Some(coordinates) => {
                let size_px = self.store.settings().marker.size_px;
                let marker = MarkerConfig {
                    coordinates,
                    icon_variant: request.icon_variant,
                    size_px,
                };
                let callout = self.build_callout(&raw_png, request, coordinates, size_px);
                self.compositor.compose(&raw_png, &marker, callout.as_ref())
            }
        };

        CaptureArtifact {
            id: CaptureId::new(),
            image_data,
            source_url: target.url.clone(),
            mode: request.mode,
            coordinates: request.coordinates,
            annotation_text: request.annotation_text.clone(),
            transcript_text: request.transcript_text.clone(),
            captured_at,
        }
    }

    /// Derive the callout config, transcript taking precedence, with the
    /// anchor clamped so the box stays inside the image. The engine trusts
    /// the anchor it receives; clamping lives here.
    fn build_callout(
        &self,
        raw_png: &[u8],
        request: &CaptureRequest,
        coordinates: Coordinates,
        size_px: u32,
    ) -> Option<TextBoxConfig> {
        let (text, kind) = match (&request.transcript_text, &request.annotation_text) {
            (Some(transcript), _) => (transcript.clone(), CalloutKind::Transcription),
            (None, Some(note)) => (note.clone(), CalloutKind::Annotation),
            (None, None) => return None,
        };
        if text.is_empty() {
            return None;
        }

        let anchor = match image::load_from_memory(raw_png) {
            Ok(img) => clamped_anchor(img.width(), img.height(), coordinates, size_px, kind, &text),
            Err(err) => {
                // The engine will fail to decode too and hand back the
                // base image; an unclamped anchor is irrelevant then.
                warn!(error = %err, "could not size base image for anchor clamping");
                coordinates
            }
        };

        Some(TextBoxConfig {
            text,
            anchor,
            anchor_size_px: size_px,
            kind,
        })
    }

    /// Persist a finished artifact via the privileged downloader.
    pub async fn save(&self, artifact: &CaptureArtifact) -> Result<DownloadId, CaptureError> {
        let params = SaveScreenshotParams {
            image_data: artifact.image_data.clone(),
            source_url: artifact.source_url.clone(),
            timestamp: artifact.captured_at,
            coordinates: artifact.coordinates,
            mode: artifact.mode,
            annotation_text: artifact.annotation_text.clone(),
            transcript_text: artifact.transcript_text.clone(),
        };
        let response = self
            .endpoint
            .send(Request::SaveScreenshot(params), SendOptions::interactive())
            .await?;
        match response {
            Response::Saved { download_id } => Ok(download_id),
            other => Err(CaptureError::Bus(BusError::Remote(ErrorBody::new(
                bus_errors::INTERNAL_ERROR,
                format!("save reply had the wrong shape: {other:?}"),
            )))),
        }
    }

    // ── Journey collection ──────────────────────────────────────────

    /// Discard the collection (journey mode left without saving).
    pub fn discard_journey(&self) {
        let mut journey = self.journey.lock();
        if !journey.is_empty() {
            debug!(discarded = journey.len(), "journey collection discarded");
        }
        journey.clear();
    }

    /// Entries accumulated so far.
    #[must_use]
    pub fn journey_len(&self) -> usize {
        self.journey.lock().len()
    }

    /// Append a finished journey capture; returns its ordinal.
    pub fn append_journey(&self, artifact: CaptureArtifact) -> u32 {
        self.journey.lock().push(artifact)
    }

    /// Persist the collection as one file per entry, then clear it.
    ///
    /// A failed send leaves the collection intact so the user can retry;
    /// only a successful reply finalizes (clears) it.
    pub async fn save_journey(&self) -> Result<u32, CaptureError> {
        let entries = self.journey.lock().entries().to_vec();
        if entries.is_empty() {
            return Ok(0);
        }

        let response = self
            .endpoint
            .send(
                Request::SaveJourneyCollection(SaveJourneyParams { entries }),
                SendOptions::interactive(),
            )
            .await?;
        match response {
            Response::JourneySaved { saved, .. } => {
                let _ = self.journey.lock().drain();
                Ok(saved)
            }
            other => Err(CaptureError::Bus(BusError::Remote(ErrorBody::new(
                bus_errors::INTERNAL_ERROR,
                format!("journey save reply had the wrong shape: {other:?}"),
            )))),
        }
    }
}
