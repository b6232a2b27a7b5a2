//! Headless browser rendering session.
//!
//! Owns one Chrome process and one tab, renders JavaScript-heavy pages, and
//! injects a fixed desktop-browser header profile into every request the
//! browser issues via CDP Fetch interception. The session is released when
//! the value is dropped, so callers get close-on-every-exit-path for free.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::browser::tab::RequestPausedDecision;
use headless_chrome::protocol::cdp::Fetch::{
    ContinueRequest, HeaderEntry, RequestPattern, RequestStage, events::RequestPausedEvent,
};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::info;

/// Header profile applied to every browser-originated request, overwriting
/// whatever Chrome would have sent for these names.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/90.0.4430.93 Safari/537.36",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Accept-Encoding", "gzip, deflate, br"),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Connection", "keep-alive"),
    ("Referer", "https://www.amazon.com/"),
    ("Host", "www.amazon.com"),
    ("TE", "Trailers"),
];

/// Policy knobs for one rendering session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed wait after navigation before the page is read back, standing
    /// in for a true render-complete signal. Longer waits trade latency for
    /// fewer partially-rendered reads; a wait-for-selector with the same
    /// minimum would be the stronger alternative.
    pub settle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
        }
    }
}

/// One headless Chrome instance plus the tab used for rendering.
pub struct RenderSession {
    /// Keeps the Chrome process alive; killed when the session drops.
    _browser: Browser,
    tab: Arc<Tab>,
    settle: Duration,
}

impl RenderSession {
    /// Launches headless Chrome and registers the header interceptor.
    ///
    /// Sandboxing and /dev/shm usage are disabled so the browser also runs
    /// inside containers and other resource-constrained environments.
    pub fn start(config: &SessionConfig) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .args(vec![OsStr::new("--disable-dev-shm-usage")])
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid browser launch options: {e}"))?;

        let browser = Browser::new(options).context("Failed to launch headless Chrome")?;
        let tab = browser.new_tab().context("Failed to open a browser tab")?;

        let patterns = vec![RequestPattern {
            url_pattern: Some("*".to_string()),
            resource_Type: None,
            request_stage: Some(RequestStage::Request),
        }];
        tab.enable_fetch(Some(&patterns), None)
            .context("Failed to enable request interception")?;
        tab.enable_request_interception(Arc::new(
            move |_transport, _session_id, event: RequestPausedEvent| inject_headers(&event),
        ))
        .context("Failed to register the header interceptor")?;

        Ok(Self {
            _browser: browser,
            tab,
            settle: config.settle,
        })
    }

    /// Navigates to `url`, waits the settle interval for client-side
    /// rendering to populate the page, and returns the rendered HTML.
    pub fn render(&self, url: &str) -> Result<String> {
        info!("Loading {url}");

        self.tab.navigate_to(url).context("Navigation failed")?;
        self.tab
            .wait_until_navigated()
            .context("Page never finished loading")?;

        // The result grid is populated by script after the navigation
        // settles, so the DOM right after load is incomplete.
        std::thread::sleep(self.settle);

        self.tab
            .get_content()
            .context("Failed to read rendered page content")
    }
}

/// Continues an intercepted request with the fixed header profile merged
/// over the headers the request already carried.
fn inject_headers(event: &RequestPausedEvent) -> RequestPausedDecision {
    let request = &event.params.request;
    let headers = merge_headers(request.headers.0.as_ref());

    RequestPausedDecision::Continue(Some(ContinueRequest {
        request_id: event.params.request_id.clone(),
        url: None,
        method: None,
        post_data: None,
        headers: Some(headers),
        intercept_response: None,
    }))
}

fn merge_headers(existing: Option<&serde_json::Value>) -> Vec<HeaderEntry> {
    let mut merged: Vec<HeaderEntry> = Vec::new();

    if let Some(existing) = existing.and_then(|v| v.as_object()) {
        for (name, value) in existing {
            let overridden = BROWSER_HEADERS
                .iter()
                .any(|(fixed, _)| fixed.eq_ignore_ascii_case(name));

            if !overridden && let Some(value) = value.as_str() {
                merged.push(HeaderEntry {
                    name: name.clone(),
                    value: value.to_string(),
                });
            }
        }
    }

    for (name, value) in BROWSER_HEADERS {
        merged.push(HeaderEntry {
            name: (*name).to_string(),
            value: (*value).to_string(),
        });
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value_of<'a>(headers: &'a [HeaderEntry], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    #[test]
    fn fixed_headers_overwrite_existing_values() {
        let existing = json!({
            "user-agent": "HeadlessChrome/90.0",
            "accept-language": "fr-FR",
        });

        let merged = merge_headers(Some(&existing));

        assert_eq!(
            value_of(&merged, "Accept-Language"),
            Some("en-US,en;q=0.9")
        );
        assert_eq!(
            merged
                .iter()
                .filter(|h| h.name.eq_ignore_ascii_case("user-agent"))
                .count(),
            1
        );
        assert!(
            value_of(&merged, "User-Agent")
                .is_some_and(|ua| !ua.contains("HeadlessChrome"))
        );
    }

    #[test]
    fn unrelated_headers_are_preserved() {
        let existing = json!({ "Cookie": "session=abc" });

        let merged = merge_headers(Some(&existing));

        assert_eq!(value_of(&merged, "Cookie"), Some("session=abc"));
        assert_eq!(value_of(&merged, "TE"), Some("Trailers"));
    }

    #[test]
    fn injects_full_profile_when_request_had_no_headers() {
        let merged = merge_headers(None);
        assert_eq!(merged.len(), BROWSER_HEADERS.len());
        assert_eq!(value_of(&merged, "Host"), Some("www.amazon.com"));
    }
}
