//! Wire-format types for the two-context protocol.
//!
//! The message surface is a closed tagged union; adding a kind means the
//! compiler walks every match at the boundary. Wire shape is camelCase
//! JSON with a SCREAMING_SNAKE_CASE `type` tag, matching the shipped
//! extension's message names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use clip_core::capture::JourneyEntry;
use clip_core::geometry::Coordinates;
use clip_core::ids::{DownloadId, RequestId};
use clip_core::state::{IconVariant, Mode};

use crate::errors::ErrorBody;

/// Parameters of a `CAPTURE_SCREENSHOT` request.
///
/// The privileged side answers with the **raw** viewport image; marker and
/// callout compositing happen on the requesting side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScreenshotParams {
    /// Point the user marked, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Marker variant the capture will composite.
    #[serde(default)]
    pub icon_variant: IconVariant,
    /// Typed note, for annotate captures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_text: Option<String>,
    /// Live transcript, for transcribe captures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_text: Option<String>,
    /// Mode the request was issued under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

/// Parameters of a `SAVE_SCREENSHOT` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScreenshotParams {
    /// Composited PNG bytes.
    #[serde(with = "clip_core::capture::png_base64")]
    pub image_data: Vec<u8>,
    /// URL of the captured page (drives the filename's hostname part).
    pub source_url: String,
    /// Capture time (drives the filename's timestamp part).
    pub timestamp: DateTime<Utc>,
    /// Marked point, when one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Mode the capture ran under (drives the filename suffix).
    pub mode: Mode,
    /// Note composited into the image, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_text: Option<String>,
    /// Transcript composited into the image, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_text: Option<String>,
}

/// Parameters of a `SAVE_JOURNEY_COLLECTION` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveJourneyParams {
    /// The collection, in click order.
    pub entries: Vec<JourneyEntry>,
}

/// A request from one context to the other.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Liveness probe.
    Ping,
    /// Grab the raw viewport image.
    CaptureScreenshot(CaptureScreenshotParams),
    /// Persist a composited capture.
    SaveScreenshot(SaveScreenshotParams),
    /// Turn a mode on.
    ActivateExtension {
        /// Mode to enter.
        mode: Mode,
        /// Marker variant for subsequent captures.
        #[serde(rename = "iconVariant")]
        icon_variant: IconVariant,
    },
    /// Turn the extension off.
    DeactivateExtension,
    /// Read the settings namespace.
    GetSettings,
    /// Deep-merge a patch into the settings namespace.
    UpdateSettings {
        /// Partial settings document.
        patch: Value,
    },
    /// Persist and clear the active journey collection.
    SaveJourneyCollection(SaveJourneyParams),
}

/// The kind of a [`Request`], used as the handler-registry key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `PING`
    Ping,
    /// `CAPTURE_SCREENSHOT`
    CaptureScreenshot,
    /// `SAVE_SCREENSHOT`
    SaveScreenshot,
    /// `ACTIVATE_EXTENSION`
    ActivateExtension,
    /// `DEACTIVATE_EXTENSION`
    DeactivateExtension,
    /// `GET_SETTINGS`
    GetSettings,
    /// `UPDATE_SETTINGS`
    UpdateSettings,
    /// `SAVE_JOURNEY_COLLECTION`
    SaveJourneyCollection,
}

impl Request {
    /// The registry key for this request.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Ping => MessageKind::Ping,
            Self::CaptureScreenshot(_) => MessageKind::CaptureScreenshot,
            Self::SaveScreenshot(_) => MessageKind::SaveScreenshot,
            Self::ActivateExtension { .. } => MessageKind::ActivateExtension,
            Self::DeactivateExtension => MessageKind::DeactivateExtension,
            Self::GetSettings => MessageKind::GetSettings,
            Self::UpdateSettings { .. } => MessageKind::UpdateSettings,
            Self::SaveJourneyCollection(_) => MessageKind::SaveJourneyCollection,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ping => "PING",
            Self::CaptureScreenshot => "CAPTURE_SCREENSHOT",
            Self::SaveScreenshot => "SAVE_SCREENSHOT",
            Self::ActivateExtension => "ACTIVATE_EXTENSION",
            Self::DeactivateExtension => "DEACTIVATE_EXTENSION",
            Self::GetSettings => "GET_SETTINGS",
            Self::UpdateSettings => "UPDATE_SETTINGS",
            Self::SaveJourneyCollection => "SAVE_JOURNEY_COLLECTION",
        };
        f.write_str(s)
    }
}

/// A successful reply payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// Reply to `PING`.
    Pong {
        /// Always true; the reply arriving is the real signal.
        alive: bool,
        /// Responder's clock, RFC3339 millis.
        timestamp: String,
    },
    /// Reply to `CAPTURE_SCREENSHOT`: the raw viewport image.
    Screenshot {
        /// Raw PNG bytes.
        #[serde(rename = "imageData", with = "clip_core::capture::png_base64")]
        image_data: Vec<u8>,
    },
    /// Reply to `SAVE_SCREENSHOT`.
    Saved {
        /// Identity assigned by the downloader.
        #[serde(rename = "downloadId")]
        download_id: DownloadId,
    },
    /// Reply to activation/deactivation.
    Ack,
    /// Reply to `GET_SETTINGS` / `UPDATE_SETTINGS`.
    Settings {
        /// The (updated) settings document.
        snapshot: Value,
    },
    /// Reply to `SAVE_JOURNEY_COLLECTION`.
    JourneySaved {
        /// How many entries were persisted.
        saved: u32,
        /// One download per entry, in collection order.
        #[serde(rename = "downloadIds")]
        download_ids: Vec<DownloadId>,
    },
}

impl Response {
    /// A pong stamped with the current time.
    #[must_use]
    pub fn pong_now() -> Self {
        Self::Pong {
            alive: true,
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// A request in flight: correlation ID plus body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation ID; the reply echoes it.
    pub id: RequestId,
    /// The request body.
    pub request: Request,
}

/// A reply to one envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Echoed correlation ID.
    pub id: RequestId,
    /// Whether the call succeeded.
    pub success: bool,
    /// Result payload (present when `success == true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    /// Error payload (present when `success == false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Reply {
    /// Build a success reply.
    #[must_use]
    pub fn success(id: RequestId, response: Response) -> Self {
        Self {
            id,
            success: true,
            response: Some(response),
            error: None,
        }
    }

    /// Build an error reply.
    #[must_use]
    pub fn error(id: RequestId, body: ErrorBody) -> Self {
        Self {
            id,
            success: false,
            response: None,
            error: Some(body),
        }
    }

    /// Collapse into a result, treating a malformed reply (success with no
    /// payload, or failure with no body) as an internal error.
    pub fn into_result(self) -> Result<Response, ErrorBody> {
        if self.success {
            self.response
                .ok_or_else(|| ErrorBody::new(crate::errors::INTERNAL_ERROR, "empty success reply"))
        } else {
            Err(self
                .error
                .unwrap_or_else(|| ErrorBody::new(crate::errors::INTERNAL_ERROR, "empty error reply")))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{RESTRICTED_PAGE, UNKNOWN_MESSAGE_TYPE};

    // ── Request serde ───────────────────────────────────────────────

    #[test]
    fn ping_wire_shape() {
        let json = serde_json::to_string(&Request::Ping).unwrap();
        assert_eq!(json, r#"{"type":"PING"}"#);
    }

    #[test]
    fn capture_request_wire_shape() {
        let req = Request::CaptureScreenshot(CaptureScreenshotParams {
            coordinates: Some(Coordinates::new(100, 50)),
            icon_variant: IconVariant::Blue,
            annotation_text: Some("note".into()),
            transcript_text: None,
            mode: Some(Mode::Annotate),
        });
        let v: Value = serde_json::to_value(&req).unwrap();
        assert_eq!(v["type"], "CAPTURE_SCREENSHOT");
        assert_eq!(v["coordinates"]["x"], 100);
        assert_eq!(v["iconVariant"], "blue");
        assert_eq!(v["annotationText"], "note");
        assert!(v.get("transcriptText").is_none());
    }

    #[test]
    fn activate_wire_shape() {
        let req = Request::ActivateExtension {
            mode: Mode::Journey,
            icon_variant: IconVariant::Dark,
        };
        let v: Value = serde_json::to_value(&req).unwrap();
        assert_eq!(v["type"], "ACTIVATE_EXTENSION");
        assert_eq!(v["mode"], "journey");
        assert_eq!(v["iconVariant"], "dark");
    }

    #[test]
    fn request_roundtrip_every_kind() {
        let requests = vec![
            Request::Ping,
            Request::CaptureScreenshot(CaptureScreenshotParams::default()),
            Request::SaveScreenshot(SaveScreenshotParams {
                image_data: vec![1, 2, 3],
                source_url: "https://example.com".into(),
                timestamp: DateTime::<Utc>::UNIX_EPOCH,
                coordinates: None,
                mode: Mode::Snap,
                annotation_text: None,
                transcript_text: None,
            }),
            Request::ActivateExtension {
                mode: Mode::Snap,
                icon_variant: IconVariant::Light,
            },
            Request::DeactivateExtension,
            Request::GetSettings,
            Request::UpdateSettings {
                patch: serde_json::json!({"marker": {"sizePx": 32}}),
            },
            Request::SaveJourneyCollection(SaveJourneyParams { entries: vec![] }),
        ];
        for req in requests {
            let json = serde_json::to_string(&req).unwrap();
            let back: Request = serde_json::from_str(&json).unwrap();
            assert_eq!(back, req);
        }
    }

    #[test]
    fn kind_matches_tag() {
        assert_eq!(Request::Ping.kind().to_string(), "PING");
        assert_eq!(
            Request::GetSettings.kind().to_string(),
            "GET_SETTINGS"
        );
        assert_eq!(
            Request::SaveJourneyCollection(SaveJourneyParams { entries: vec![] })
                .kind()
                .to_string(),
            "SAVE_JOURNEY_COLLECTION"
        );
    }

    // ── Reply ───────────────────────────────────────────────────────

    #[test]
    fn success_reply_has_no_error_field() {
        let reply = Reply::success(RequestId::from("r1"), Response::Ack);
        let json = serde_json::to_string(&reply).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("\"success\":true"));
    }

    #[test]
    fn error_reply_has_no_response_field() {
        let reply = Reply::error(
            RequestId::from("r2"),
            ErrorBody::new(RESTRICTED_PAGE, "chrome page"),
        );
        let json = serde_json::to_string(&reply).unwrap();
        assert!(!json.contains("response"));
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["error"]["code"], "RESTRICTED_PAGE");
    }

    #[test]
    fn into_result_success() {
        let reply = Reply::success(RequestId::from("r"), Response::Ack);
        assert_eq!(reply.into_result().unwrap(), Response::Ack);
    }

    #[test]
    fn into_result_error() {
        let reply = Reply::error(
            RequestId::from("r"),
            ErrorBody::new(UNKNOWN_MESSAGE_TYPE, "no handler"),
        );
        let body = reply.into_result().unwrap_err();
        assert_eq!(body.code, UNKNOWN_MESSAGE_TYPE);
    }

    #[test]
    fn into_result_malformed_success() {
        let reply = Reply {
            id: RequestId::from("r"),
            success: true,
            response: None,
            error: None,
        };
        assert!(reply.into_result().is_err());
    }

    #[test]
    fn pong_now_is_alive_with_timestamp() {
        let Response::Pong { alive, timestamp } = Response::pong_now() else {
            panic!("expected pong");
        };
        assert!(alive);
        assert!(timestamp.ends_with('Z'));
    }

    #[test]
    fn screenshot_response_base64_roundtrip() {
        let resp = Response::Screenshot {
            image_data: vec![9, 8, 7],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("imageData"));
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }

    // ── Wire format fixtures ────────────────────────────────────────

    #[test]
    fn wire_format_envelope() {
        let raw = r#"{"id": "req_1", "request": {"type": "DEACTIVATE_EXTENSION"}}"#;
        let env: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(env.id.as_str(), "req_1");
        assert_eq!(env.request, Request::DeactivateExtension);
    }

    #[test]
    fn wire_format_error_reply() {
        let raw = r#"{"id": "req_2", "success": false, "error": {"code": "NO_TARGET", "message": "no page"}}"#;
        let reply: Reply = serde_json::from_str(raw).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error.unwrap().code, "NO_TARGET");
    }
}
