//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ClipSettings::default()`]
//! 2. If `~/.insight-clip/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ClipSettings;

/// Resolve the path to the settings file (`~/.insight-clip/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
        .join(".insight-clip")
        .join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ClipSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ClipSettings> {
    let defaults = serde_json::to_value(ClipSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ClipSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are silently ignored (fall back to file/default)
pub fn apply_env_overrides(settings: &mut ClipSettings) {
    // ── Marker settings ─────────────────────────────────────────────
    if let Some(v) = read_env_u32("CLIP_MARKER_SIZE_PX", 16, 256) {
        settings.marker.size_px = v;
    }
    if let Some(v) = read_env_string("CLIP_ICON_VARIANT") {
        if let Ok(variant) = serde_json::from_value(Value::String(v)) {
            settings.marker.icon_variant = variant;
        }
    }

    // ── Save settings ───────────────────────────────────────────────
    if let Some(v) = read_env_string("CLIP_SAVE_DIR") {
        settings.saving.directory = v;
    }
    if let Some(v) = read_env_string("CLIP_FILENAME_PREFIX") {
        settings.saving.filename_prefix = v;
    }

    // ── Capture settings ────────────────────────────────────────────
    if let Some(v) = read_env_u64("CLIP_MIN_CAPTURE_INTERVAL_MS", 100, 60_000) {
        settings.capture.min_interval_ms = v;
    }
    if let Some(v) = read_env_u64("CLIP_JOURNEY_TIMEOUT_MS", 100, 60_000) {
        settings.capture.journey_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("CLIP_INTERACTIVE_TIMEOUT_MS", 100, 600_000) {
        settings.capture.interactive_timeout_ms = v;
    }
    if let Some(v) = read_env_u32("CLIP_INTERACTIVE_RETRIES", 0, 10) {
        settings.capture.interactive_retries = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_u32_range(&v, min, max))
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_u64_range(&v, min, max))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.capture.min_interval_ms, 1000);
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(br#"{"capture": {"minIntervalMs": 500}}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.capture.min_interval_ms, 500);
        // Untouched leaves keep their defaults
        assert_eq!(settings.capture.journey_timeout_ms, 2000);
        assert_eq!(settings.marker.size_px, 64);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }

    #[test]
    fn deep_merge_recurses_objects() {
        let a = serde_json::json!({"m": {"x": 1, "y": 2}});
        let b = serde_json::json!({"m": {"y": 3}});
        let merged = deep_merge(a, b);
        assert_eq!(merged["m"]["x"], 1);
        assert_eq!(merged["m"]["y"], 3);
    }

    #[test]
    fn deep_merge_replaces_arrays() {
        let a = serde_json::json!({"xs": [1, 2, 3]});
        let b = serde_json::json!({"xs": [9]});
        let merged = deep_merge(a, b);
        assert_eq!(merged["xs"], serde_json::json!([9]));
    }

    #[test]
    fn deep_merge_skips_nulls() {
        let a = serde_json::json!({"keep": "me"});
        let b = serde_json::json!({"keep": null});
        let merged = deep_merge(a, b);
        assert_eq!(merged["keep"], "me");
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn parse_u64_range_enforces_bounds() {
        assert_eq!(parse_u64_range("1000", 100, 60_000), Some(1000));
        assert_eq!(parse_u64_range("50", 100, 60_000), None);
        assert_eq!(parse_u64_range("99999999", 100, 60_000), None);
        assert_eq!(parse_u64_range("abc", 100, 60_000), None);
    }

    #[test]
    fn parse_u32_range_enforces_bounds() {
        assert_eq!(parse_u32_range("64", 16, 256), Some(64));
        assert_eq!(parse_u32_range("8", 16, 256), None);
    }

    #[test]
    fn settings_path_under_insight_clip_dir() {
        let path = settings_path();
        assert!(path.to_string_lossy().contains(".insight-clip"));
        assert!(path.to_string_lossy().ends_with("settings.json"));
    }
}
