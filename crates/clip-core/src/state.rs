//! Mode and extension-state model.

use serde::{Deserialize, Serialize};

/// Capture mode the extension is operating in.
///
/// Dormancy is not a mode: it is [`ExtensionState::active`] being false, so
/// the "exactly one mode" invariant holds trivially.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Plain point capture: marker only.
    Snap,
    /// Marker plus a typed note rendered as a callout.
    Annotate,
    /// Marker plus a live speech transcript rendered as a callout.
    Transcribe,
    /// Every qualifying click captures; results accumulate in a collection.
    Journey,
}

impl Mode {
    /// Whether this mode captures on every primary click rather than only
    /// on modifier-clicks.
    #[must_use]
    pub fn captures_every_click(self) -> bool {
        matches!(self, Self::Journey)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Snap => "snap",
            Self::Annotate => "annotate",
            Self::Transcribe => "transcribe",
            Self::Journey => "journey",
        };
        f.write_str(s)
    }
}

/// Marker icon variant, selecting both the asset and the fallback palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconVariant {
    /// Off-white marker for dark page content.
    Light,
    /// Accent-blue marker (default).
    #[default]
    Blue,
    /// Near-black marker for light page content.
    Dark,
}

impl IconVariant {
    /// Asset file stem for this variant (`marker-{stem}.png`).
    #[must_use]
    pub fn asset_stem(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Blue => "blue",
            Self::Dark => "dark",
        }
    }
}

/// The mode controller's owned state.
///
/// Mutated only through the controller's activate/deactivate operations;
/// every other component works from a snapshot passed by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionState {
    /// Whether any mode is active.
    pub active: bool,
    /// The mode that applies while `active` is true.
    #[serde(rename = "currentMode", skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    /// Marker variant selected at activation time.
    #[serde(rename = "selectedIconVariant")]
    pub icon_variant: IconVariant,
}

impl ExtensionState {
    /// The dormant state: inactive, no mode, default variant.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            mode: None,
            icon_variant: IconVariant::default(),
        }
    }

    /// An active state in the given mode.
    #[must_use]
    pub fn active(mode: Mode, icon_variant: IconVariant) -> Self {
        Self {
            active: true,
            mode: Some(mode),
            icon_variant,
        }
    }
}

impl Default for ExtensionState {
    fn default() -> Self {
        Self::inactive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Snap).unwrap(), "\"snap\"");
        assert_eq!(
            serde_json::to_string(&Mode::Transcribe).unwrap(),
            "\"transcribe\""
        );
        let back: Mode = serde_json::from_str("\"journey\"").unwrap();
        assert_eq!(back, Mode::Journey);
    }

    #[test]
    fn only_journey_captures_every_click() {
        assert!(Mode::Journey.captures_every_click());
        assert!(!Mode::Snap.captures_every_click());
        assert!(!Mode::Annotate.captures_every_click());
        assert!(!Mode::Transcribe.captures_every_click());
    }

    #[test]
    fn icon_variant_default_is_blue() {
        assert_eq!(IconVariant::default(), IconVariant::Blue);
    }

    #[test]
    fn icon_variant_asset_stems() {
        assert_eq!(IconVariant::Light.asset_stem(), "light");
        assert_eq!(IconVariant::Blue.asset_stem(), "blue");
        assert_eq!(IconVariant::Dark.asset_stem(), "dark");
    }

    #[test]
    fn inactive_state_has_no_mode() {
        let s = ExtensionState::inactive();
        assert!(!s.active);
        assert!(s.mode.is_none());
    }

    #[test]
    fn state_wire_shape() {
        let s = ExtensionState::active(Mode::Annotate, IconVariant::Dark);
        let v: serde_json::Value = serde_json::to_value(s).unwrap();
        assert_eq!(v["active"], true);
        assert_eq!(v["currentMode"], "annotate");
        assert_eq!(v["selectedIconVariant"], "dark");
    }

    #[test]
    fn inactive_state_omits_mode_field() {
        let json = serde_json::to_string(&ExtensionState::inactive()).unwrap();
        assert!(!json.contains("currentMode"));
    }

    #[test]
    fn state_roundtrip() {
        let s = ExtensionState::active(Mode::Journey, IconVariant::Light);
        let json = serde_json::to_string(&s).unwrap();
        let back: ExtensionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
