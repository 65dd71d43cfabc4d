//! Saved-file naming convention.
//!
//! `insight-clip_{hostname}_{timestamp}{suffix}.png`, where the timestamp
//! is RFC3339 with millisecond precision and `:`/`.` replaced by `-` so the
//! name survives every filesystem the downloads folder might live on.

use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

use crate::constants::SAVE_FILENAME_PREFIX;

/// Filename suffix, keyed by what was composited into the capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilenameSuffix {
    /// Plain capture.
    #[default]
    None,
    /// A typed note was composited.
    Annotated,
    /// A transcript was composited.
    Transcribed,
    /// Entry of a saved journey collection, by ordinal.
    Journey(u32),
}

impl FilenameSuffix {
    fn render(self) -> String {
        match self {
            Self::None => String::new(),
            Self::Annotated => "_annotated".to_owned(),
            Self::Transcribed => "_transcribed".to_owned(),
            Self::Journey(ordinal) => format!("_journey-{ordinal}"),
        }
    }
}

/// Build the filename for a saved capture.
///
/// The hostname comes from the source URL; URLs without a host (or that do
/// not parse) fall back to `"page"` rather than failing the save.
#[must_use]
pub fn save_filename(source_url: &str, timestamp: DateTime<Utc>, suffix: FilenameSuffix) -> String {
    let hostname = Url::parse(source_url)
        .ok()
        .and_then(|u| u.host_str().map(ToOwned::to_owned))
        .unwrap_or_else(|| "page".to_owned());
    let stamp = timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!(
        "{SAVE_FILENAME_PREFIX}_{hostname}_{stamp}{}.png",
        suffix.render()
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn epoch_plain_capture() {
        let name = save_filename(
            "https://example.com/a",
            DateTime::<Utc>::UNIX_EPOCH,
            FilenameSuffix::None,
        );
        assert_eq!(name, "insight-clip_example.com_1970-01-01T00-00-00-000Z.png");
    }

    #[test]
    fn annotated_suffix() {
        let name = save_filename(
            "https://example.com/a",
            DateTime::<Utc>::UNIX_EPOCH,
            FilenameSuffix::Annotated,
        );
        assert!(name.ends_with("_annotated.png"));
    }

    #[test]
    fn transcribed_suffix() {
        let name = save_filename(
            "https://sub.example.org/x?y=1",
            DateTime::<Utc>::UNIX_EPOCH,
            FilenameSuffix::Transcribed,
        );
        assert!(name.starts_with("insight-clip_sub.example.org_"));
        assert!(name.ends_with("_transcribed.png"));
    }

    #[test]
    fn journey_suffix_carries_ordinal() {
        let name = save_filename(
            "https://example.com",
            DateTime::<Utc>::UNIX_EPOCH,
            FilenameSuffix::Journey(3),
        );
        assert!(name.ends_with("_journey-3.png"));
    }

    #[test]
    fn timestamp_has_no_colons_or_dots() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 7, 13, 45, 9).unwrap();
        let name = save_filename("https://example.com", ts, FilenameSuffix::None);
        let stamp = name
            .strip_prefix("insight-clip_example.com_")
            .and_then(|rest| rest.strip_suffix(".png"))
            .unwrap();
        assert!(!stamp.contains(':'));
        assert!(!stamp.contains('.'));
        assert!(stamp.ends_with('Z'));
    }

    #[test]
    fn hostless_url_falls_back() {
        let name = save_filename("not a url", DateTime::<Utc>::UNIX_EPOCH, FilenameSuffix::None);
        assert!(name.starts_with("insight-clip_page_"));
    }
}
