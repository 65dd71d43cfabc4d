//! Settings schema.
//!
//! Field defaults match the shipped extension so a missing or partial
//! settings file always yields a working configuration.

use serde::{Deserialize, Serialize};

use clip_core::constants::{
    INTERACTIVE_SEND_TIMEOUT_MS, JOURNEY_SEND_TIMEOUT_MS, MARKER_SIZE_PX, MIN_CAPTURE_INTERVAL_MS,
    SAVE_FILENAME_PREFIX,
};
use clip_core::state::IconVariant;

/// Root settings document (the `settings` namespace of the store).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSettings {
    /// Marker appearance.
    #[serde(default)]
    pub marker: MarkerSettings,
    /// Save-location preferences.
    #[serde(default)]
    pub saving: SaveSettings,
    /// Capture timing knobs.
    #[serde(default)]
    pub capture: CaptureSettings,
}

/// Marker appearance preferences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSettings {
    /// Marker edge length in pixels.
    #[serde(default = "default_marker_size")]
    pub size_px: u32,
    /// Preferred icon variant for new activations.
    #[serde(default)]
    pub icon_variant: IconVariant,
}

fn default_marker_size() -> u32 {
    MARKER_SIZE_PX
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            size_px: MARKER_SIZE_PX,
            icon_variant: IconVariant::default(),
        }
    }
}

/// Where and how captures are persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettings {
    /// Directory captures are written into.
    #[serde(default = "default_save_dir")]
    pub directory: String,
    /// Filename prefix; the convention's hostname/timestamp parts follow it.
    #[serde(default = "default_prefix")]
    pub filename_prefix: String,
}

fn default_save_dir() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/Downloads")
}

fn default_prefix() -> String {
    SAVE_FILENAME_PREFIX.to_owned()
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            directory: default_save_dir(),
            filename_prefix: default_prefix(),
        }
    }
}

/// Capture-pipeline timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    /// Minimum interval the rate limiter enforces between captures, in ms.
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,
    /// Bus timeout for journey captures, in ms.
    #[serde(default = "default_journey_timeout")]
    pub journey_timeout_ms: u64,
    /// Bus timeout for interactive captures, in ms.
    #[serde(default = "default_interactive_timeout")]
    pub interactive_timeout_ms: u64,
    /// Timeout retries for interactive sends.
    #[serde(default = "default_interactive_retries")]
    pub interactive_retries: u32,
}

fn default_min_interval() -> u64 {
    MIN_CAPTURE_INTERVAL_MS
}

fn default_journey_timeout() -> u64 {
    JOURNEY_SEND_TIMEOUT_MS
}

fn default_interactive_timeout() -> u64 {
    INTERACTIVE_SEND_TIMEOUT_MS
}

fn default_interactive_retries() -> u32 {
    1
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: MIN_CAPTURE_INTERVAL_MS,
            journey_timeout_ms: JOURNEY_SEND_TIMEOUT_MS,
            interactive_timeout_ms: INTERACTIVE_SEND_TIMEOUT_MS,
            interactive_retries: 1,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = ClipSettings::default();
        assert_eq!(settings.marker.size_px, 64);
        assert_eq!(settings.marker.icon_variant, IconVariant::Blue);
        assert_eq!(settings.saving.filename_prefix, "insight-clip");
        assert_eq!(settings.capture.min_interval_ms, 1000);
        assert_eq!(settings.capture.journey_timeout_ms, 2000);
        assert_eq!(settings.capture.interactive_timeout_ms, 10_000);
        assert_eq!(settings.capture.interactive_retries, 1);
    }

    #[test]
    fn empty_document_deserializes_to_defaults() {
        let settings: ClipSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ClipSettings::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let settings: ClipSettings =
            serde_json::from_str(r#"{"marker": {"sizePx": 48}}"#).unwrap();
        assert_eq!(settings.marker.size_px, 48);
        assert_eq!(settings.marker.icon_variant, IconVariant::Blue);
        assert_eq!(settings.capture.min_interval_ms, 1000);
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let json = serde_json::to_string(&ClipSettings::default()).unwrap();
        assert!(json.contains("sizePx"));
        assert!(json.contains("iconVariant"));
        assert!(json.contains("minIntervalMs"));
        assert!(json.contains("filenamePrefix"));
    }

    #[test]
    fn roundtrip() {
        let mut settings = ClipSettings::default();
        settings.capture.min_interval_ms = 250;
        settings.marker.icon_variant = IconVariant::Dark;
        let json = serde_json::to_string(&settings).unwrap();
        let back: ClipSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
