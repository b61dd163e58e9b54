//! Audit orchestration.
//!
//! Sequences the pipeline: validate input, acquire the page, resolve and
//! download scripts, run the detectors and the event extractor over the
//! frozen snapshot, analyze events, score, and assemble the result. The
//! orchestrator owns all per-call state; nothing persists across calls.

use log::{debug, info};

use crate::detectors::{
    detect_ga4, detect_google_ads, detect_gtm, detect_meta_pixel, detect_shopify_pixels,
    MULTIPLE_GA4_IDS,
};
use crate::error_handling::AuditError;
use crate::events::{extract_events, find_duplicate_events, validate_event_parameters};
use crate::initialization::{init_page_client, init_script_client};
use crate::models::{
    AuditResult, DetectorResult, EventPlatform, EventRecord, ExternalScript, ScriptInfo,
};
use crate::page::{acquire_from_html, acquire_from_url};
use crate::scoring::{summarize, ScoreInput};
use crate::scripts::resolve_scripts;

/// The `url` value reported for manual-HTML audits.
pub const MANUAL_HTML_URL: &str = "manual-html-input";

/// Input for one audit call.
#[derive(Debug, Clone, Default)]
pub struct AuditInput {
    /// Page URL to fetch. Either this or `html` must be non-empty.
    pub url: Option<String>,
    /// Caller-supplied page HTML, used instead of fetching.
    pub html: Option<String>,
    /// Include raw external scripts, duplicates, and per-event analysis in
    /// the result.
    pub include_details: bool,
    /// Caller trace ID, echoed back when `include_details` is set.
    pub trace_id: Option<String>,
}

impl AuditInput {
    /// Audit a page by URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        AuditInput {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Audit caller-supplied HTML without any page fetch.
    pub fn from_html(html: impl Into<String>) -> Self {
        AuditInput {
            html: Some(html.into()),
            ..Default::default()
        }
    }
}

impl From<&str> for AuditInput {
    fn from(url: &str) -> Self {
        AuditInput::from_url(url)
    }
}

/// Runs one complete audit.
///
/// # Errors
///
/// * [`AuditError::UrlOrHtmlRequired`] when both `url` and `html` are empty
///   after trimming
/// * [`AuditError::InvalidUrl`] for unparseable URLs
/// * Page-fetch errors (status, timeout, transport) from URL mode
///
/// Everything past the page fetch degrades instead of erroring: failed
/// script downloads, malformed literals, and broken embedded JSON all
/// reduce audit completeness, never abort it.
pub async fn run_audit(input: AuditInput) -> Result<AuditResult, AuditError> {
    let url = input
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());
    let html = input.html.as_deref().filter(|h| !h.trim().is_empty());

    let (page, audited_url) = match (url, html) {
        (Some(url), _) => {
            url::Url::parse(url).map_err(|e| AuditError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            info!("Auditing {}", url);
            let client = init_page_client()?;
            (acquire_from_url(&client, url).await?, url.to_string())
        }
        (None, Some(html)) => {
            info!("Auditing manually supplied HTML ({} bytes)", html.len());
            (acquire_from_html(html), MANUAL_HTML_URL.to_string())
        }
        (None, None) => return Err(AuditError::UrlOrHtmlRequired),
    };

    let script_client = init_script_client()?;
    let scripts = resolve_scripts(&script_client, &page, url).await;
    debug!(
        "Resolved {} scripts ({} external)",
        scripts.len(),
        scripts.iter().filter(|s| s.src.is_some()).count()
    );

    // The snapshot is frozen from here on; every detector is pure over it
    let mut ga4 = detect_ga4(&page.html, &scripts);
    let gtm = detect_gtm(&page.html, &scripts);
    let meta_pixel = detect_meta_pixel(&page.html, &scripts);
    let mut google_ads = detect_google_ads(&page.html, &scripts);
    let shopify_pixels = detect_shopify_pixels(&page.html);

    // Web-pixel configs carry IDs the flat detectors cannot see through the
    // escaped JSON; route them into the platform results the way the tags
    // would register at runtime.
    merge_ga4_ids(&mut ga4, &shopify_pixels.ga4_ids);
    if merge_ads_ids(&mut google_ads, &shopify_pixels.ads_ids) {
        google_ads.detected = true;
    }

    let mut events = extract_events(&page.html, &scripts);
    for name in &shopify_pixels.synthesized_meta_events {
        let exists = events
            .iter()
            .any(|e| e.platform == EventPlatform::MetaPixel && e.name == *name);
        if !exists {
            events.push(EventRecord::new(EventPlatform::MetaPixel, name.clone()));
        }
    }

    let duplicates = find_duplicate_events(&events);
    let analysis = validate_event_parameters(&events);
    let summary = summarize(&ScoreInput {
        ga4: &ga4,
        gtm: &gtm,
        meta_pixel: &meta_pixel,
        duplicates: &duplicates,
        issues: &analysis,
    });

    info!(
        "Audit of {} complete: score {} with {} issue(s)",
        audited_url, summary.tracking_health_score, summary.issues_found
    );

    let (external_scripts, duplicates, analysis, trace_id) = if input.include_details {
        (
            Some(external_script_dump(&scripts)),
            Some(duplicates),
            Some(analysis),
            input.trace_id.clone(),
        )
    } else {
        (None, None, None, None)
    };

    Ok(AuditResult {
        status: "ok",
        url: audited_url,
        ga4,
        gtm,
        meta_pixel,
        google_ads,
        merchant_center: DetectorResult::default(),
        shopify: shopify_pixels.info,
        events,
        summary,
        external_scripts,
        duplicates,
        analysis,
        trace_id,
    })
}

fn merge_ga4_ids(result: &mut DetectorResult, extra: &[String]) {
    let mut added = false;
    for id in extra {
        if !result.ids.contains(id) {
            result.ids.push(id.clone());
            added = true;
        }
    }
    if added {
        result.detected = true;
        if result.ids.len() > 1 && !result.errors.iter().any(|e| e == MULTIPLE_GA4_IDS) {
            result.errors.push(MULTIPLE_GA4_IDS.to_string());
        }
    }
}

fn merge_ads_ids(result: &mut crate::models::GoogleAdsResult, extra: &[String]) -> bool {
    let mut added = false;
    for id in extra {
        if !result.ids.contains(id) {
            result.ids.push(id.clone());
            added = true;
        }
    }
    added
}

fn external_script_dump(scripts: &[ScriptInfo]) -> Vec<ExternalScript> {
    scripts
        .iter()
        .filter_map(|script| {
            script.src.as_ref().map(|src| ExternalScript {
                src: src.clone(),
                content: if script.content.is_empty() {
                    None
                } else {
                    Some(script.content.clone())
                },
            })
        })
        .collect()
}
