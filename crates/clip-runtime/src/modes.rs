//! The mode lifecycle state machine.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use clip_core::capture::PageTarget;
use clip_core::geometry::Coordinates;
use clip_core::policy::is_restricted_url;
use clip_core::state::{ExtensionState, IconVariant, Mode};
use clip_settings::SettingsStore;

use crate::errors::ActivationError;

/// One pointer action, as the presentation layer reports it.
#[derive(Clone, Copy, Debug)]
pub struct PointerEvent {
    /// Where the action landed.
    pub coordinates: Coordinates,
    /// Whether the primary button was used.
    pub primary_button: bool,
    /// Whether the capture modifier key was held.
    pub modifier_held: bool,
    /// Whether the action landed on the extension's own UI surface.
    pub on_extension_surface: bool,
}

impl PointerEvent {
    /// A plain primary click at a point.
    #[must_use]
    pub fn primary_click(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            primary_button: true,
            modifier_held: false,
            on_extension_surface: false,
        }
    }

    /// The same click with the modifier held.
    #[must_use]
    pub fn with_modifier(mut self) -> Self {
        self.modifier_held = true;
        self
    }
}

/// What a pointer action means under the current mode.
///
/// The caller owns what happens next: `CaptureAndPassThrough` means the
/// page's default handling must be scheduled without waiting for the
/// capture, since journey mode intercepts every click and must not eat
/// them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickDecision {
    /// Not a capture trigger; do nothing.
    Ignore,
    /// Capture, interactively (the caller may collect a note first).
    Capture,
    /// Capture in the background and let the page's default action run.
    CaptureAndPassThrough,
}

/// Finite state machine owning [`ExtensionState`].
///
/// State lives behind a sync lock that is never held across an await. The
/// persisted store is the cross-context source of truth: activation writes
/// it first (failure leaves local state untouched), and changes made by
/// other contexts flow back in via [`refresh_from`](Self::refresh_from).
pub struct ModeController {
    state: RwLock<ExtensionState>,
    store: Arc<SettingsStore>,
}

impl ModeController {
    /// Build a controller seeded from the store's persisted blob.
    #[must_use]
    pub fn new(store: Arc<SettingsStore>) -> Self {
        let state = store.extension_state();
        Self {
            state: RwLock::new(state),
            store,
        }
    }

    /// Current state, by value.
    #[must_use]
    pub fn snapshot(&self) -> ExtensionState {
        *self.state.read()
    }

    /// Enter a mode (from dormancy or from another mode).
    ///
    /// The restricted-page check runs before any mutation, and the store
    /// write happens before the local one, so every failure path leaves
    /// prior state fully intact.
    pub fn activate(
        &self,
        mode: Mode,
        icon_variant: IconVariant,
        target: &PageTarget,
    ) -> Result<(), ActivationError> {
        if is_restricted_url(&target.url) {
            debug!(url = %target.url, "activation refused: restricted page");
            return Err(ActivationError::RestrictedPage {
                url: target.url.clone(),
            });
        }

        let next = ExtensionState::active(mode, icon_variant);
        self.store.set_extension_state(next)?;
        *self.state.write() = next;
        info!(%mode, variant = icon_variant.asset_stem(), "extension activated");
        Ok(())
    }

    /// Leave whatever mode is active. Idempotent: deactivating while
    /// dormant is a no-op, not an error, and commits nothing.
    pub fn deactivate(&self) -> Result<(), ActivationError> {
        if !self.state.read().active {
            return Ok(());
        }
        let next = ExtensionState::inactive();
        self.store.set_extension_state(next)?;
        *self.state.write() = next;
        info!("extension deactivated");
        Ok(())
    }

    /// Adopt a state another context committed to the store.
    pub fn refresh_from(&self, state: ExtensionState) {
        let mut current = self.state.write();
        if *current != state {
            debug!(?state, "refreshing mode cache from store");
            *current = state;
        }
    }

    /// Pure predicate: what does this pointer action mean right now?
    ///
    /// In journey mode every primary click off the extension surface
    /// qualifies (the rate limiter has the final say later). In the other
    /// active modes a click qualifies only with the modifier held.
    /// Dormant: nothing qualifies.
    #[must_use]
    pub fn decide(&self, event: &PointerEvent) -> ClickDecision {
        let snapshot = *self.state.read();
        if !snapshot.active || !event.primary_button || event.on_extension_surface {
            return ClickDecision::Ignore;
        }
        match snapshot.mode {
            Some(Mode::Journey) => ClickDecision::CaptureAndPassThrough,
            Some(_) if event.modifier_held => ClickDecision::Capture,
            _ => ClickDecision::Ignore,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
