//! # clip-runtime
//!
//! The capture pipeline's moving parts, owned by one explicitly
//! constructed [`ClipSession`] per displayed page:
//!
//! - [`ModeController`] — the activation state machine gating what a
//!   pointer action means
//! - [`CaptureRateLimiter`] — protects the capture primitive from being
//!   driven faster than the platform allows
//! - [`CaptureOrchestrator`] — turns "coordinates + mode" into a
//!   composited artifact via the bus and the compositor
//! - the journey collector — the continuous-capture variant accumulating
//!   one artifact per qualifying click
//!
//! There are no global singletons: every service is built by the session
//! and passed by `Arc` to exactly the components that need it.

#![deny(unsafe_code)]

pub mod errors;
pub mod journey;
pub mod limiter;
pub mod modes;
pub mod orchestrator;
pub mod session;

pub use errors::{ActivationError, CaptureError};
pub use journey::JourneyCollection;
pub use limiter::CaptureRateLimiter;
pub use modes::{ClickDecision, ModeController, PointerEvent};
pub use orchestrator::{CaptureOrchestrator, FixedTarget, TargetResolver};
pub use session::ClipSession;
