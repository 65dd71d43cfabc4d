//! The top-level session object.
//!
//! One [`ClipSession`] per displayed page owns every service instance —
//! controller, orchestrator, compositor, bus endpoint — and wires the
//! page-side message handlers. Nothing in the pipeline is a module-level
//! singleton.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use clip_bus::{Endpoint, ErrorBody, MessageKind, Request, Response, errors as bus_errors};
use clip_bus::registry::MessageHandler;
use clip_compose::Compositor;
use clip_core::capture::{CaptureOutcome, CaptureRequest};
use clip_core::geometry::Coordinates;
use clip_core::ids::DownloadId;
use clip_core::state::Mode;
use clip_settings::SettingsStore;

use crate::errors::CaptureError;
use crate::modes::{ClickDecision, ModeController, PointerEvent};
use crate::orchestrator::{CaptureOrchestrator, TargetResolver};

/// Session object for one page context.
pub struct ClipSession {
    controller: Arc<ModeController>,
    orchestrator: Arc<CaptureOrchestrator>,
    store: Arc<SettingsStore>,
    endpoint: Arc<Endpoint>,
}

impl ClipSession {
    /// Build a session and attach it to the page endpoint.
    ///
    /// Registers the page-side handlers (`PING`, `ACTIVATE_EXTENSION`,
    /// `DEACTIVATE_EXTENSION`) and spawns the store listener that keeps
    /// the mode cache fresh and drives the journey collection lifecycle.
    #[must_use]
    pub fn new(
        endpoint: Arc<Endpoint>,
        store: Arc<SettingsStore>,
        compositor: Compositor,
        target: Arc<dyn TargetResolver>,
    ) -> Arc<Self> {
        let controller = Arc::new(ModeController::new(store.clone()));
        let orchestrator = Arc::new(CaptureOrchestrator::new(
            endpoint.clone(),
            compositor,
            store.clone(),
            target.clone(),
        ));

        let session = Arc::new(Self {
            controller,
            orchestrator,
            store,
            endpoint,
        });
        session.register_handlers(target);
        session.spawn_store_listener();
        session
    }

    /// The mode controller (read-only callers use [`ModeController::snapshot`]).
    #[must_use]
    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    /// The capture orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &CaptureOrchestrator {
        &self.orchestrator
    }

    /// The page endpoint this session is attached to.
    #[must_use]
    pub fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    fn register_handlers(self: &Arc<Self>, target: Arc<dyn TargetResolver>) {
        let registry = self.endpoint.registry();
        registry.register(MessageKind::Ping, PingHandler);
        registry.register(
            MessageKind::ActivateExtension,
            ActivateHandler {
                controller: self.controller.clone(),
                target,
            },
        );
        registry.register(
            MessageKind::DeactivateExtension,
            DeactivateHandler {
                controller: self.controller.clone(),
            },
        );
    }

    /// Listen for store commits: refresh the mode cache and discard the
    /// journey collection when journey mode is left, regardless of which
    /// context made the change.
    ///
    /// Exit is the only transition that touches the collection — it is
    /// born empty and every exit path empties it again, so an entry
    /// transition has nothing to do (and clearing there would race the
    /// first click's capture).
    fn spawn_store_listener(self: &Arc<Self>) {
        let mut rx = self.store.subscribe();
        let weak = Arc::downgrade(self);
        let is_journey = |state: &clip_core::state::ExtensionState| {
            state.active && state.mode == Some(Mode::Journey)
        };
        let mut was_journey = is_journey(&rx.borrow().extension_state);

        drop(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let Some(session) = weak.upgrade() else {
                    break;
                };
                let snapshot = rx.borrow_and_update().clone();
                session.controller.refresh_from(snapshot.extension_state);

                let now_journey = is_journey(&snapshot.extension_state);
                if !now_journey && was_journey {
                    session.orchestrator.discard_journey();
                }
                was_journey = now_journey;
            }
            debug!("store listener ended");
        }));
    }

    /// Route one pointer action.
    ///
    /// Journey captures are spawned, never awaited: the decision returns
    /// immediately so the caller can schedule the page's default handling
    /// without waiting on the pipeline.
    #[must_use]
    pub fn handle_click(self: &Arc<Self>, event: PointerEvent) -> ClickDecision {
        let decision = self.controller.decide(&event);
        if decision == ClickDecision::CaptureAndPassThrough {
            self.spawn_journey_capture(event.coordinates);
        }
        decision
    }

    fn spawn_journey_capture(self: &Arc<Self>, coordinates: Coordinates) {
        let session = self.clone();
        drop(tokio::spawn(async move {
            let state = session.controller.snapshot();
            let request = CaptureRequest::at(coordinates, state.icon_variant, Mode::Journey);
            match session.orchestrator.capture(request).await {
                Ok(CaptureOutcome::Captured(artifact)) => {
                    // The mode may have changed across the bus suspension
                    // points; a capture finishing after journey exit must
                    // not resurrect a discarded collection.
                    let state = session.controller.snapshot();
                    if state.active && state.mode == Some(Mode::Journey) {
                        let ordinal = session.orchestrator.append_journey(*artifact);
                        debug!(ordinal, "journey capture appended");
                    } else {
                        debug!("journey capture finished after mode exit, dropped");
                    }
                }
                // Rate-limited journey clicks are dropped silently.
                Ok(CaptureOutcome::RateLimited) => {}
                Err(err) => debug!(error = %err, "journey capture failed"),
            }
        }));
    }

    /// Run an interactive capture (snap/annotate/transcribe) at a point.
    #[instrument(skip_all, fields(x = coordinates.x, y = coordinates.y))]
    pub async fn capture_interactive(
        &self,
        coordinates: Coordinates,
        annotation_text: Option<String>,
        transcript_text: Option<String>,
    ) -> Result<CaptureOutcome, CaptureError> {
        let state = self.controller.snapshot();
        let mode = state.mode.unwrap_or(Mode::Snap);
        let mut request = CaptureRequest::at(coordinates, state.icon_variant, mode);
        request.annotation_text = annotation_text;
        request.transcript_text = transcript_text;
        self.orchestrator.capture(request).await
    }

    /// Capture and, when the limiter admits it, persist in one step.
    ///
    /// Returns `Ok(None)` for a rate-limited attempt; the caller renders
    /// that as a soft notice, not a failure.
    pub async fn capture_and_save(
        &self,
        coordinates: Coordinates,
        annotation_text: Option<String>,
        transcript_text: Option<String>,
    ) -> Result<Option<DownloadId>, CaptureError> {
        match self
            .capture_interactive(coordinates, annotation_text, transcript_text)
            .await?
        {
            CaptureOutcome::Captured(artifact) => {
                let id = self.orchestrator.save(&artifact).await?;
                Ok(Some(id))
            }
            CaptureOutcome::RateLimited => Ok(None),
        }
    }
}

// ── Page-side handlers ──────────────────────────────────────────────────────

/// Answers `PING` so the privileged side can probe page liveness.
struct PingHandler;

#[async_trait]
impl MessageHandler for PingHandler {
    async fn handle(&self, _request: Request) -> Result<Response, ErrorBody> {
        Ok(Response::pong_now())
    }
}

/// Applies `ACTIVATE_EXTENSION` to the mode controller.
struct ActivateHandler {
    controller: Arc<ModeController>,
    target: Arc<dyn TargetResolver>,
}

#[async_trait]
impl MessageHandler for ActivateHandler {
    async fn handle(&self, request: Request) -> Result<Response, ErrorBody> {
        let Request::ActivateExtension { mode, icon_variant } = request else {
            return Err(ErrorBody::new(
                bus_errors::INVALID_PARAMS,
                "wrong request shape for ACTIVATE_EXTENSION",
            ));
        };
        let target = self.target.resolve().ok_or_else(|| {
            ErrorBody::new(bus_errors::NO_TARGET, "no page to activate on")
        })?;
        self.controller
            .activate(mode, icon_variant, &target)
            .map_err(|err| match err {
                crate::errors::ActivationError::RestrictedPage { url } => {
                    ErrorBody::new(bus_errors::RESTRICTED_PAGE, url)
                }
                crate::errors::ActivationError::Store(e) => {
                    ErrorBody::new(bus_errors::SETTINGS_ERROR, e.to_string())
                }
            })?;
        Ok(Response::Ack)
    }
}

/// Applies `DEACTIVATE_EXTENSION` to the mode controller.
struct DeactivateHandler {
    controller: Arc<ModeController>,
}

#[async_trait]
impl MessageHandler for DeactivateHandler {
    async fn handle(&self, _request: Request) -> Result<Response, ErrorBody> {
        self.controller
            .deactivate()
            .map_err(|err| ErrorBody::new(bus_errors::SETTINGS_ERROR, err.to_string()))?;
        Ok(Response::Ack)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
