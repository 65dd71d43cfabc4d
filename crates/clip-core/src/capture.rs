//! Capture request and outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Coordinates;
use crate::ids::CaptureId;
use crate::state::{IconVariant, Mode};

/// One user action's worth of capture input.
///
/// Created per pointer event, consumed once by the orchestrator, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    /// Where the user pointed; absent for a bare viewport grab.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Marker variant to composite.
    pub icon_variant: IconVariant,
    /// Typed note for annotate mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_text: Option<String>,
    /// Live transcript for transcribe mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_text: Option<String>,
    /// Mode the request was issued under.
    pub mode: Mode,
}

impl CaptureRequest {
    /// A plain marker-only request at the given point.
    #[must_use]
    pub fn at(coordinates: Coordinates, icon_variant: IconVariant, mode: Mode) -> Self {
        Self {
            coordinates: Some(coordinates),
            icon_variant,
            annotation_text: None,
            transcript_text: None,
            mode,
        }
    }

    /// Attach a typed note.
    #[must_use]
    pub fn with_annotation(mut self, text: impl Into<String>) -> Self {
        self.annotation_text = Some(text.into());
        self
    }

    /// Attach a transcript.
    #[must_use]
    pub fn with_transcript(mut self, text: impl Into<String>) -> Self {
        self.transcript_text = Some(text.into());
        self
    }
}

/// The page a capture targets, as resolved by the privileged side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTarget {
    /// The page's URL; drives the restricted-page check and the filename.
    pub url: String,
    /// Page title, when the platform exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PageTarget {
    /// Build a target from a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }
}

/// A finished composited capture, ready for persistence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureArtifact {
    /// Identity of this capture attempt.
    pub id: CaptureId,
    /// Composited PNG bytes.
    #[serde(with = "crate::capture::png_base64")]
    pub image_data: Vec<u8>,
    /// URL of the page the capture came from.
    pub source_url: String,
    /// Mode the capture ran under.
    pub mode: Mode,
    /// Marked point, when one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Note composited into the image, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_text: Option<String>,
    /// Transcript composited into the image, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_text: Option<String>,
    /// When the raw image was captured.
    pub captured_at: DateTime<Utc>,
}

/// Outcome of one capture attempt.
///
/// `RateLimited` is a normal outcome, not an error: journey captures drop
/// it silently and interactive callers show a soft notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The capture ran to completion.
    Captured(Box<CaptureArtifact>),
    /// The rate limiter rejected the attempt; nothing was captured.
    RateLimited,
}

impl CaptureOutcome {
    /// The artifact, when the capture completed.
    #[must_use]
    pub fn artifact(&self) -> Option<&CaptureArtifact> {
        match self {
            Self::Captured(artifact) => Some(artifact),
            Self::RateLimited => None,
        }
    }
}

/// One entry of a journey collection.
///
/// Accumulated in click order while journey mode is active; persisted as a
/// separate file per entry when the collection is saved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyEntry {
    /// Identity of the capture that produced this entry.
    pub id: CaptureId,
    /// Position in the collection, starting at 1.
    pub ordinal: u32,
    /// Composited PNG bytes.
    #[serde(with = "crate::capture::png_base64")]
    pub image_data: Vec<u8>,
    /// URL of the page the capture came from.
    pub source_url: String,
    /// Clicked point.
    pub coordinates: Coordinates,
    /// When the raw image was captured.
    pub captured_at: DateTime<Utc>,
}

/// Base64 transport encoding for PNG bytes inside JSON payloads.
pub mod png_base64 {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize raw bytes as a standard-alphabet base64 string.
    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    /// Deserialize a base64 string back into raw bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(de)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_attaches_texts() {
        let req = CaptureRequest::at(Coordinates::new(1, 2), IconVariant::Blue, Mode::Annotate)
            .with_annotation("broken layout");
        assert_eq!(req.annotation_text.as_deref(), Some("broken layout"));
        assert!(req.transcript_text.is_none());
    }

    #[test]
    fn request_wire_omits_absent_texts() {
        let req = CaptureRequest::at(Coordinates::new(0, 0), IconVariant::Light, Mode::Snap);
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("annotationText"));
        assert!(!json.contains("transcriptText"));
        assert!(json.contains("iconVariant"));
    }

    #[test]
    fn artifact_roundtrips_image_bytes_as_base64() {
        let artifact = CaptureArtifact {
            id: CaptureId::from("cap-1"),
            image_data: vec![0x89, 0x50, 0x4e, 0x47],
            source_url: "https://example.com/a".into(),
            mode: Mode::Snap,
            coordinates: Some(Coordinates::new(10, 20)),
            annotation_text: None,
            transcript_text: None,
            captured_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains("iVBORw"), "PNG magic should be base64: {json}");
        let back: CaptureArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn outcome_artifact_accessor() {
        assert!(CaptureOutcome::RateLimited.artifact().is_none());
    }
}
