//! Page acquisition.
//!
//! Obtains page content either by fetching a URL (bounded timeout,
//! browser-like headers, redirects followed) or from a caller-supplied HTML
//! blob, then splits `<script>` tags into inline bodies and external
//! references. Fetch failures here are terminal for the audit; everything
//! downstream degrades instead.

use std::sync::LazyLock;

use log::debug;
use scraper::{Html, Selector};

use crate::config::{MAX_PAGE_BODY_SIZE, MAX_SCRIPT_CONTENT_SIZE, PAGE_FETCH_TIMEOUT};
use crate::error_handling::AuditError;
use crate::models::{ExternalScript, PageContent};

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script").expect("Failed to parse script selector - this is a bug")
});

/// Builds a [`PageContent`] from caller-supplied HTML (manual mode).
pub fn acquire_from_html(html: &str) -> PageContent {
    let (inline_scripts, external_scripts) = extract_scripts(html);
    PageContent {
        html: html.to_string(),
        inline_scripts,
        external_scripts,
    }
}

/// Fetches a URL and builds a [`PageContent`] from the response body.
///
/// # Errors
///
/// * [`AuditError::PageFetchStatus`] for non-2xx responses
/// * [`AuditError::PageFetchTimeout`] when the deadline elapses
/// * [`AuditError::PageFetchFailed`] for DNS/connection/transport failures
///
/// All three error messages point the caller at the manual-HTML fallback.
pub async fn acquire_from_url(
    client: &reqwest::Client,
    url: &str,
) -> Result<PageContent, AuditError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_fetch_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AuditError::PageFetchStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| classify_fetch_error(url, e))?;
    let body: String = if body.len() > MAX_PAGE_BODY_SIZE {
        debug!(
            "Truncating page body for {} ({} bytes over cap)",
            url,
            body.len() - MAX_PAGE_BODY_SIZE
        );
        body.chars().take(MAX_PAGE_BODY_SIZE).collect()
    } else {
        body
    };

    debug!("Fetched {} ({} bytes)", url, body.len());
    Ok(acquire_from_html(&body))
}

fn classify_fetch_error(url: &str, error: reqwest::Error) -> AuditError {
    if error.is_timeout() {
        AuditError::PageFetchTimeout {
            url: url.to_string(),
            seconds: PAGE_FETCH_TIMEOUT.as_secs(),
        }
    } else {
        AuditError::PageFetchFailed {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Splits the page's `<script>` tags into inline bodies and external
/// references. Tags carrying a `src` attribute become external entries;
/// tags with non-empty trimmed bodies become inline entries. Per-script
/// content is capped.
pub fn extract_scripts(html: &str) -> (Vec<String>, Vec<ExternalScript>) {
    let document = Html::parse_document(html);
    let mut inline_scripts = Vec::new();
    let mut external_scripts = Vec::new();

    for element in document.select(&SCRIPT_SELECTOR) {
        if let Some(src) = element.value().attr("src") {
            let src = src.trim();
            if !src.is_empty() {
                external_scripts.push(ExternalScript {
                    src: src.to_string(),
                    content: None,
                });
                continue;
            }
        }
        let content: String = element.text().collect();
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            inline_scripts.push(trimmed.chars().take(MAX_SCRIPT_CONTENT_SIZE).collect());
        }
    }

    (inline_scripts, external_scripts)
}
