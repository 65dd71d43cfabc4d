//! Restricted-page policy.
//!
//! Captures cannot run on browser-internal surfaces. The denylist lives in
//! one place so the activation check and the capture-time check can never
//! disagree.

use url::Url;

/// URL schemes the capture pipeline must never touch.
const RESTRICTED_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "about",
    "edge",
    "devtools",
    "view-source",
];

/// Store hosts that reject content scripts even over https.
const RESTRICTED_HOSTS: &[&str] = &[
    "chrome.google.com",
    "chromewebstore.google.com",
    "microsoftedge.microsoft.com",
];

/// Whether a page URL is off-limits for activation and capture.
///
/// Unparseable URLs are treated as restricted: if we cannot tell what the
/// page is, we must not inject into it.
#[must_use]
pub fn is_restricted_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return true;
    };
    if RESTRICTED_SCHEMES.contains(&url.scheme()) {
        return true;
    }
    url.host_str()
        .is_some_and(|host| RESTRICTED_HOSTS.contains(&host))
}
