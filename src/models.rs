//! Data models for the audit pipeline and its serialized result.
//!
//! The serialized shape (camelCase field names, `type` for the event
//! platform) is the contract consumed by the surrounding application; the
//! structs here derive `Serialize` so `AuditResult` can be handed straight
//! to a JSON boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumIter};

/// The page content acquired for one audit: raw HTML plus the split script
/// view. Created once per audit; external entries gain `content` after
/// download.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// The raw page HTML.
    pub html: String,
    /// Bodies of inline `<script>` tags (non-empty after trimming).
    pub inline_scripts: Vec<String>,
    /// References from `<script src=...>` tags.
    pub external_scripts: Vec<ExternalScript>,
}

/// An external script reference extracted from the page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalScript {
    /// The `src` attribute as written in the page.
    pub src: String,
    /// Downloaded script body, if the script was selected and the download
    /// succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Whether a script was inline in the page or referenced by URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Script body was inline in the page HTML.
    Inline,
    /// Script was referenced via a `src` attribute.
    External,
}

/// The unified script view consumed by detectors and the event extractor.
///
/// Invariant: external entries either carry downloaded content or an empty
/// string (download failure is non-fatal).
#[derive(Debug, Clone)]
pub struct ScriptInfo {
    /// Inline or external.
    pub kind: ScriptKind,
    /// Script body (empty for externals that were not downloaded).
    pub content: String,
    /// Resolved source URL for external scripts.
    pub src: Option<String>,
    /// True for known third-party vendor scripts whose content must not be
    /// mined for site-authored events.
    pub exclude_from_events: bool,
}

impl ScriptInfo {
    /// Builds an inline entry.
    pub fn inline(content: impl Into<String>) -> Self {
        ScriptInfo {
            kind: ScriptKind::Inline,
            content: content.into(),
            src: None,
            exclude_from_events: false,
        }
    }

    /// Builds an external entry with no content yet.
    pub fn external(src: impl Into<String>) -> Self {
        ScriptInfo {
            kind: ScriptKind::External,
            content: String::new(),
            src: Some(src.into()),
            exclude_from_events: false,
        }
    }
}

/// Per-platform detection result (GA4, Meta Pixel, merchant center).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorResult {
    /// True iff at least one valid ID was found (Meta Pixel: or the loader
    /// script was found with no extractable ID).
    pub detected: bool,
    /// Deduplicated, case-normalized IDs.
    pub ids: Vec<String>,
    /// Closed-vocabulary error codes describing install/config problems.
    pub errors: Vec<String>,
}

/// GTM detection result. Same shape as [`DetectorResult`] but the ID list
/// serializes as `containers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GtmResult {
    /// True iff at least one valid container ID was found.
    pub detected: bool,
    /// Deduplicated container IDs.
    pub containers: Vec<String>,
    /// Closed-vocabulary error codes.
    pub errors: Vec<String>,
}

/// Google Ads detection result; adds the `send_to` conversion linker strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAdsResult {
    /// True iff at least one valid AW- ID was found.
    pub detected: bool,
    /// Deduplicated AW- IDs (bare numeric conversion IDs are normalized).
    pub ids: Vec<String>,
    /// Closed-vocabulary error codes.
    pub errors: Vec<String>,
    /// Detected `send_to` conversion-linker strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversions: Option<Vec<String>>,
}

/// Shopify storefront findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyInfo {
    /// True when storefront fingerprints were recognized.
    pub is_shopify: bool,
    /// Human names of recognized pixel apps.
    pub apps_detected: Vec<String>,
    /// True when the web-pixels-manager runtime was seen.
    pub has_web_pixels_manager: bool,
    /// TikTok pixel codes configured through web pixels.
    pub tiktok_pixel_ids: Vec<String>,
}

/// Platform an extracted event belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum EventPlatform {
    /// `gtag('event', ...)` and GA4-shaped dataLayer pushes.
    #[serde(rename = "GA4")]
    #[strum(serialize = "GA4")]
    Ga4,
    /// `dataLayer.push({event: ...})` calls.
    #[serde(rename = "GTM")]
    #[strum(serialize = "GTM")]
    Gtm,
    /// `fbq('track'|'trackCustom', ...)` calls.
    #[serde(rename = "MetaPixel")]
    #[strum(serialize = "MetaPixel")]
    MetaPixel,
}

/// One event-firing call site found in the page or its scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The platform the call site belongs to.
    #[serde(rename = "type")]
    pub platform: EventPlatform,
    /// Event name as written at the call site.
    pub name: String,
    /// Parameter object passed with the event, as parsed key/value pairs.
    pub params: Map<String, Value>,
}

impl EventRecord {
    /// Builds a record with no parameters.
    pub fn new(platform: EventPlatform, name: impl Into<String>) -> Self {
        EventRecord {
            platform,
            name: name.into(),
            params: Map::new(),
        }
    }

    /// The deduplication/capping key for this record.
    pub fn key(&self) -> (EventPlatform, String) {
        (self.platform, self.name.clone())
    }
}

/// A required-parameter violation for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventIssue {
    /// The offending event.
    pub event: EventRecord,
    /// Required parameter names absent from `event.params`.
    pub missing_params: Vec<String>,
}

/// Score and recommendations derived from the detection results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    /// Tracking health score in `[0, 100]`.
    pub tracking_health_score: i32,
    /// Number of distinct issues that contributed penalties.
    pub issues_found: usize,
    /// Human-readable recommendations, detector-then-event order.
    pub recommendations: Vec<String>,
}

/// The complete result of one audit run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    /// Literal `"ok"`; failures are surfaced as errors, not results.
    pub status: &'static str,
    /// The audited URL, or `"manual-html-input"` for HTML mode.
    pub url: String,
    /// GA4 detection result.
    pub ga4: DetectorResult,
    /// GTM detection result.
    pub gtm: GtmResult,
    /// Meta Pixel detection result.
    pub meta_pixel: DetectorResult,
    /// Google Ads detection result.
    pub google_ads: GoogleAdsResult,
    /// Reserved; always empty in this engine.
    pub merchant_center: DetectorResult,
    /// Shopify storefront findings.
    pub shopify: ShopifyInfo,
    /// Extracted events (capped per platform/name key).
    pub events: Vec<EventRecord>,
    /// Score and recommendations.
    pub summary: AuditSummary,
    /// Raw external-script view; present only with `include_details`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_scripts: Option<Vec<ExternalScript>>,
    /// Duplicate event occurrences; present only with `include_details`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<Vec<EventRecord>>,
    /// Per-event required-parameter analysis; present only with
    /// `include_details`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Vec<EventIssue>>,
    /// Caller-supplied trace ID, echoed back with `include_details`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_platform_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventPlatform::Ga4).unwrap(),
            "\"GA4\""
        );
        assert_eq!(
            serde_json::to_string(&EventPlatform::MetaPixel).unwrap(),
            "\"MetaPixel\""
        );
        assert_eq!(EventPlatform::Gtm.to_string(), "GTM");
    }

    #[test]
    fn test_event_record_serializes_platform_as_type() {
        let record = EventRecord::new(EventPlatform::Ga4, "purchase");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "GA4");
        assert_eq!(json["name"], "purchase");
    }

    #[test]
    fn test_detail_fields_omitted_when_absent() {
        let result = AuditResult {
            status: "ok",
            url: "manual-html-input".into(),
            ga4: DetectorResult::default(),
            gtm: GtmResult::default(),
            meta_pixel: DetectorResult::default(),
            google_ads: GoogleAdsResult::default(),
            merchant_center: DetectorResult::default(),
            shopify: ShopifyInfo::default(),
            events: vec![],
            summary: AuditSummary::default(),
            external_scripts: None,
            duplicates: None,
            analysis: None,
            trace_id: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("externalScripts").is_none());
        assert!(json.get("traceId").is_none());
        assert_eq!(json["metaPixel"]["detected"], false);
        assert_eq!(json["summary"]["trackingHealthScore"], 0);
    }
}
