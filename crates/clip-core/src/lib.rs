//! # clip-core
//!
//! Shared vocabulary for the InsightClip capture pipeline.
//!
//! Everything the other crates exchange lives here: branded IDs, viewport
//! geometry, the mode/state model, capture request and outcome types, the
//! restricted-URL policy, and the saved-file naming convention. This crate
//! is deliberately free of async machinery so every other crate can depend
//! on it without pulling in a runtime.

#![deny(unsafe_code)]

pub mod capture;
pub mod constants;
pub mod filename;
pub mod geometry;
pub mod ids;
pub mod policy;
pub mod state;

pub use capture::{CaptureArtifact, CaptureOutcome, CaptureRequest, JourneyEntry, PageTarget};
pub use filename::{save_filename, FilenameSuffix};
pub use geometry::Coordinates;
pub use ids::{CaptureId, DownloadId, RequestId};
pub use policy::is_restricted_url;
pub use state::{ExtensionState, IconVariant, Mode};
