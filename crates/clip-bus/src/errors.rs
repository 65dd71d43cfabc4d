//! Bus error codes and error types.

use serde::{Deserialize, Serialize};

// ── Error code constants ────────────────────────────────────────────

/// The sending context's runtime handle is gone; reload the page.
pub const CONTEXT_INVALIDATED: &str = "CONTEXT_INVALIDATED";
/// No reply arrived within the configured window.
pub const TIMEOUT: &str = "TIMEOUT";
/// No handler is registered for the message kind.
pub const UNKNOWN_MESSAGE_TYPE: &str = "UNKNOWN_MESSAGE_TYPE";
/// Capture cannot run on the targeted page.
pub const RESTRICTED_PAGE: &str = "RESTRICTED_PAGE";
/// No page is available to capture.
pub const NO_TARGET: &str = "NO_TARGET";
/// The capture primitive failed.
pub const CAPTURE_FAILED: &str = "CAPTURE_FAILED";
/// Persisting an image failed.
pub const SAVE_FAILED: &str = "SAVE_FAILED";
/// Reading or patching the settings store failed.
pub const SETTINGS_ERROR: &str = "SETTINGS_ERROR";
/// Required parameter missing or malformed.
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
/// Unexpected internal error in a handler.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Structured error body inside a [`crate::protocol::Reply`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. `RESTRICTED_PAGE`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorBody {
    /// Build an error body.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Sender-side failure of a bus call.
///
/// `Timeout` and `Remote` are deliberately distinct terminal states:
/// "nobody answered" and "somebody answered no" get different reactions
/// from callers (retry/drop vs. surface).
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The sending context's runtime handle is no longer valid.
    #[error("extension context invalidated; reload the page")]
    ContextInvalidated,

    /// No reply within the configured window, across all attempts.
    #[error("no reply after {attempts} attempt(s)")]
    Timeout {
        /// Total send attempts made (1-based).
        attempts: u32,
    },

    /// The receiving context replied with an explicit error. Not retried.
    #[error("remote error: {0}")]
    Remote(ErrorBody),

    /// The wire to the peer is gone (peer task ended).
    #[error("bus channel closed")]
    ChannelClosed,
}

impl BusError {
    /// Machine-readable code for this failure.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::ContextInvalidated => CONTEXT_INVALIDATED,
            Self::Timeout { .. } => TIMEOUT,
            Self::Remote(body) => &body.code,
            Self::ChannelClosed => CONTEXT_INVALIDATED,
        }
    }

    /// Whether this failure is the liveness class (reload the page).
    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        matches!(self, Self::ContextInvalidated | Self::ChannelClosed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
