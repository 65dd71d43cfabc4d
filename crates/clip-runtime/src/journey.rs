//! The journey collection.

use clip_core::capture::{CaptureArtifact, JourneyEntry};
use clip_core::geometry::Coordinates;

/// Ordered captures accumulated while journey mode is active.
///
/// Created on mode entry, appended to per qualifying click, and either
/// drained by "save journey" or discarded on mode exit. Ordinals are
/// 1-based and reset with each new collection.
#[derive(Debug, Default)]
pub struct JourneyCollection {
    entries: Vec<JourneyEntry>,
}

impl JourneyCollection {
    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accumulated entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a finished capture; returns its ordinal.
    pub fn push(&mut self, artifact: CaptureArtifact) -> u32 {
        let ordinal = self.entries.len() as u32 + 1;
        self.entries.push(JourneyEntry {
            id: artifact.id,
            ordinal,
            image_data: artifact.image_data,
            source_url: artifact.source_url,
            coordinates: artifact.coordinates.unwrap_or(Coordinates::new(0, 0)),
            captured_at: artifact.captured_at,
        });
        ordinal
    }

    /// Snapshot the entries without draining, in click order.
    #[must_use]
    pub fn entries(&self) -> &[JourneyEntry] {
        &self.entries
    }

    /// Drain the collection, leaving it empty.
    pub fn drain(&mut self) -> Vec<JourneyEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Discard everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
