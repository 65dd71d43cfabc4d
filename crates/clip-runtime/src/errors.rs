//! Runtime error taxonomy.
//!
//! Unrecoverable conditions propagate as these typed results; recoverable
//! ones (rate limiting, asset failure) never appear here — they are
//! outcomes or silent fallbacks.

use thiserror::Error;

use clip_bus::BusError;
use clip_settings::SettingsError;

/// Activation refused.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// The target page is a restricted system surface. Checked before any
    /// state mutation, so prior state is always intact.
    #[error("cannot activate on restricted page: {url}")]
    RestrictedPage {
        /// The offending URL.
        url: String,
    },

    /// Persisting the state blob failed; local state was not changed.
    #[error("state persistence failed: {0}")]
    Store(#[from] SettingsError),
}

/// A capture attempt failed outright.
///
/// Rate limiting is deliberately absent: it is a
/// [`clip_core::CaptureOutcome`] variant, not an error.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The resolved page is a restricted system surface.
    #[error("capture refused on restricted page: {url}")]
    RestrictedPage {
        /// The offending URL.
        url: String,
    },

    /// There is no page to capture.
    #[error("no capture target")]
    NoTarget,

    /// The cross-context call failed (invalidated, timed out, or the
    /// privileged side replied with an error).
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl CaptureError {
    /// Whether the user should be told to reload the page.
    #[must_use]
    pub fn needs_reload(&self) -> bool {
        matches!(self, Self::Bus(err) if err.is_invalidated())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restricted_page_display_names_url() {
        let err = ActivationError::RestrictedPage {
            url: "chrome://settings".into(),
        };
        assert!(err.to_string().contains("chrome://settings"));
    }

    #[test]
    fn bus_invalidation_needs_reload() {
        let err = CaptureError::Bus(BusError::ContextInvalidated);
        assert!(err.needs_reload());
        let err = CaptureError::Bus(BusError::Timeout { attempts: 2 });
        assert!(!err.needs_reload());
        assert!(!CaptureError::NoTarget.needs_reload());
    }
}
