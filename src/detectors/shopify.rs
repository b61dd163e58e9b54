//! Shopify Web Pixels detection.
//!
//! Shopify storefronts embed a `webPixelsConfigList` JSON array in the page,
//! where each pixel app's settings are JSON-encoded *as a string*, and some
//! apps nest a further JSON string inside that (`configuration` ->
//! `config`). Every parse level degrades independently to a flat regex
//! scrape, so a malformed level yields partial results instead of nothing.
//!
//! A separate storefront check recognizes the web-pixels-manager runtime and
//! maps known pixel-app client IDs to human app names.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::config::{
    DetectionProfile, GA4_PROFILE, GOOGLE_ADS_PROFILE, SHOPIFY_APP_IDS, SHOPIFY_GT_PROFILE,
    SHOPIFY_MC_PROFILE,
};
use super::compile_pattern;
use crate::js_parsing::extract_array_literal;
use crate::models::ShopifyInfo;

static CONFIG_LIST_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"webPixelsConfigList['"]?\s*[:=]"#,
        "Shopify CONFIG_LIST_KEY_PATTERN",
    )
});

static GA4_FLAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(r"\b(G-[A-Za-z0-9]{6,14})\b", "Shopify GA4_FLAT_PATTERN"));
static ADS_FLAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(r"\b(AW-[0-9]{9,11})\b", "Shopify ADS_FLAT_PATTERN"));
static GT_FLAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(r"\b(GT-[A-Za-z0-9]{6,14})\b", "Shopify GT_FLAT_PATTERN"));
static MC_FLAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(r"\b(MC-[A-Za-z0-9]{6,14})\b", "Shopify MC_FLAT_PATTERN"));

static ACTION_LABEL_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(r"(AW-[0-9]{9,11})(?:/[A-Za-z0-9_-]+)?", "Shopify ACTION_LABEL_ID_PATTERN")
});

static API_CLIENT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"['"]?apiClientId['"]?\s*:\s*['"]?([0-9]+)"#,
        "Shopify API_CLIENT_ID_PATTERN",
    )
});

static TIKTOK_PIXEL_CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"(?i)\\?['"]pixel_?code\\?['"]\s*:\s*\\?['"]([A-Z0-9]{10,30})"#,
        "Shopify TIKTOK_PIXEL_CODE_PATTERN",
    )
});

/// Storefront fingerprints: any of these marks the page as Shopify-served.
const STOREFRONT_FINGERPRINTS: &[&str] = &[
    "web-pixels-manager",
    "monorail-edge.shopifysvc.com",
    "trekkie",
    "cdn.shopify.com",
];

/// The ecommerce events Shopify's Meta app auto-fires through the web-pixels
/// sandbox. They never appear literally in the HTML, so finding the app
/// installed is the only signal they will fire.
pub const SHOPIFY_META_APP_EVENTS: &[&str] = &[
    "PageView",
    "ViewContent",
    "AddToCart",
    "InitiateCheckout",
    "AddPaymentInfo",
    "Purchase",
    "Search",
];

/// Everything the Shopify Web Pixels detector can find. Google tag IDs are
/// bucketed by prefix; the orchestrator routes the GA4/Ads buckets into the
/// matching platform results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopifyPixelsResult {
    /// `G-` measurement IDs configured through the Google app.
    pub ga4_ids: Vec<String>,
    /// `AW-` conversion IDs configured through the Google app.
    pub ads_ids: Vec<String>,
    /// `GT-` tag IDs (gtag destination IDs).
    pub gt_ids: Vec<String>,
    /// `MC-` Merchant Center IDs; collected but not emitted (reserved).
    pub merchant_center_ids: Vec<String>,
    /// Configured gtag event types (e.g. "purchase", "add_to_cart").
    pub gtag_event_types: Vec<String>,
    /// Meta Pixel event names the Shopify Meta app will auto-fire.
    pub synthesized_meta_events: Vec<String>,
    /// Storefront-level findings.
    pub info: ShopifyInfo,
}

/// Validates a raw candidate and files it into the prefix bucket it belongs
/// to. Buckets stay deduplicated across every parse and fallback pass.
fn add_bucketed_id(result: &mut ShopifyPixelsResult, raw: &str) {
    type Bucket = fn(&mut ShopifyPixelsResult) -> &mut Vec<String>;
    let (profile, bucket): (&DetectionProfile, Bucket) =
        if raw.len() >= 2 && raw[..2].eq_ignore_ascii_case("G-") {
            (&*GA4_PROFILE, |r| &mut r.ga4_ids)
        } else if raw.len() >= 3 && raw[..3].eq_ignore_ascii_case("AW-") {
            (&*GOOGLE_ADS_PROFILE, |r| &mut r.ads_ids)
        } else if raw.len() >= 3 && raw[..3].eq_ignore_ascii_case("GT-") {
            (&*SHOPIFY_GT_PROFILE, |r| &mut r.gt_ids)
        } else if raw.len() >= 3 && raw[..3].eq_ignore_ascii_case("MC-") {
            (&*SHOPIFY_MC_PROFILE, |r| &mut r.merchant_center_ids)
        } else {
            return;
        };
    if let Some(id) = profile.validate(raw) {
        let ids = bucket(result);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
}

/// Detects Shopify Web Pixels configuration and storefront fingerprints.
///
/// Pure and synchronous over the page HTML; web-pixel configs are served
/// inline, never in downloadable scripts.
pub fn detect_shopify_pixels(html: &str) -> ShopifyPixelsResult {
    let mut result = ShopifyPixelsResult::default();
    detect_storefront(html, &mut result.info);

    let Some(config_list) = extract_config_list(html) else {
        if result.info.has_web_pixels_manager {
            // Manager present but no parseable list: scrape the page once
            log::debug!("web-pixels-manager present without a parseable config list");
            scrape_ids(html, &mut result);
        }
        return result;
    };

    match serde_json::from_str::<Value>(&config_list) {
        Ok(Value::Array(entries)) => {
            for entry in &entries {
                process_entry(entry, html, &mut result);
            }
        }
        _ => {
            // Top-level parse failed: flat-scan the list text, then the
            // whole page as a second pass.
            log::debug!("webPixelsConfigList is not valid JSON, falling back to flat scan");
            scrape_ids(&config_list, &mut result);
            scrape_ids(html, &mut result);
            scrape_tiktok_codes(html, &mut result);
        }
    }

    result
}

fn detect_storefront(html: &str, info: &mut ShopifyInfo) {
    info.has_web_pixels_manager = html.contains("web-pixels-manager");
    info.is_shopify = STOREFRONT_FINGERPRINTS.iter().any(|fp| html.contains(fp));

    let mut seen = HashSet::new();
    for cap in API_CLIENT_ID_PATTERN.captures_iter(html) {
        if let Some(id) = cap.get(1) {
            if let Some(&(_, app_name)) = SHOPIFY_APP_IDS.iter().find(|(app_id, _)| *app_id == id.as_str()) {
                if seen.insert(app_name) {
                    info.apps_detected.push(app_name.to_string());
                }
            }
        }
    }
}

fn extract_config_list(html: &str) -> Option<String> {
    let key = CONFIG_LIST_KEY_PATTERN.find(html)?;
    extract_array_literal(html, key.end()).map(|s| s.to_string())
}

fn process_entry(entry: &Value, html: &str, result: &mut ShopifyPixelsResult) {
    // Level 2: the entry's configuration is JSON-as-string
    let Some(configuration) = entry.get("configuration").and_then(Value::as_str) else {
        return;
    };
    let parsed = match serde_json::from_str::<Value>(configuration) {
        Ok(value) => value,
        Err(_) => {
            log::debug!("pixel configuration is not valid JSON, falling back to flat scan");
            scrape_ids(configuration, result);
            scrape_ids(html, result);
            scrape_tiktok_codes(configuration, result);
            return;
        }
    };

    // Level 3: some apps nest one more JSON string under "config"
    let innermost = match parsed.get("config").and_then(Value::as_str) {
        Some(config_str) => match serde_json::from_str::<Value>(config_str) {
            Ok(value) => value,
            Err(_) => {
                log::debug!("nested pixel config is not valid JSON, falling back to flat scan");
                scrape_ids(config_str, result);
                scrape_ids(html, result);
                scrape_tiktok_codes(config_str, result);
                return;
            }
        },
        None => parsed,
    };

    extract_google_config(&innermost, result);
    extract_meta_config(&innermost, result);
    extract_tiktok_config(&innermost, result);
}

fn extract_google_config(config: &Value, result: &mut ShopifyPixelsResult) {
    if let Some(ids) = config.get("google_tag_ids").and_then(Value::as_array) {
        for id in ids.iter().filter_map(Value::as_str) {
            add_bucketed_id(result, id);
        }
    }

    if let Some(events) = config.get("gtag_events").and_then(Value::as_array) {
        for event in events {
            if let Some(event_type) = event
                .get("type")
                .or_else(|| event.get("event_type"))
                .and_then(Value::as_str)
            {
                if !result.gtag_event_types.iter().any(|t| t == event_type) {
                    result.gtag_event_types.push(event_type.to_string());
                }
            }
            // Action labels look like "AW-123456789/AbCdEf" and carry IDs
            // the google_tag_ids list may omit
            if let Some(label) = event
                .get("action_label")
                .or_else(|| event.get("actionLabel"))
                .and_then(Value::as_str)
            {
                for cap in ACTION_LABEL_ID_PATTERN.captures_iter(label) {
                    if let Some(id) = cap.get(1) {
                        add_bucketed_id(result, id.as_str());
                    }
                }
            }
        }
    }
}

fn extract_meta_config(config: &Value, result: &mut ShopifyPixelsResult) {
    let pixel_type = config
        .get("pixel_type")
        .or_else(|| config.get("pixelType"))
        .and_then(Value::as_str);
    if pixel_type == Some("facebook_pixel") {
        for event in SHOPIFY_META_APP_EVENTS {
            let name = event.to_string();
            if !result.synthesized_meta_events.contains(&name) {
                result.synthesized_meta_events.push(name);
            }
        }
    }
}

fn extract_tiktok_config(config: &Value, result: &mut ShopifyPixelsResult) {
    if let Some(code) = config
        .get("pixel_code")
        .or_else(|| config.get("pixelCode"))
        .and_then(Value::as_str)
    {
        let code = code.to_string();
        if !result.tiktok_ids_contains(&code) {
            result.info.tiktok_pixel_ids.push(code);
        }
    }
}

impl ShopifyPixelsResult {
    fn tiktok_ids_contains(&self, code: &str) -> bool {
        self.info.tiktok_pixel_ids.iter().any(|c| c == code)
    }
}

fn scrape_ids(text: &str, result: &mut ShopifyPixelsResult) {
    for pattern in [
        &*GA4_FLAT_PATTERN,
        &*ADS_FLAT_PATTERN,
        &*GT_FLAT_PATTERN,
        &*MC_FLAT_PATTERN,
    ] {
        for cap in pattern.captures_iter(text) {
            if let Some(id) = cap.get(1) {
                add_bucketed_id(result, id.as_str());
            }
        }
    }
}

fn scrape_tiktok_codes(text: &str, result: &mut ShopifyPixelsResult) {
    for cap in TIKTOK_PIXEL_CODE_PATTERN.captures_iter(text) {
        if let Some(code) = cap.get(1) {
            let code = code.as_str().to_string();
            if !result.tiktok_ids_contains(&code) {
                result.info.tiktok_pixel_ids.push(code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Three nesting levels, as Shopify actually serves them: the list is
    // JSON, each configuration is a JSON string, and the Google app nests
    // one more JSON string under "config".
    fn google_app_html() -> String {
        let inner = r#"{"google_tag_ids":["G-ABC1234567","AW-9876543210"],"gtag_events":[{"type":"purchase","action_label":"AW-9876543210/AbCdEf"},{"type":"add_to_cart","action_label":"AW-1112223334/XyZ_12"}]}"#;
        let configuration = serde_json::to_string(&serde_json::json!({ "config": inner })).unwrap();
        let entry = serde_json::json!({
            "id": "shopify-app-pixel-1",
            "type": "APP",
            "apiClientId": 1780363,
            "configuration": configuration,
        });
        format!(
            r#"<html><head><script id="web-pixels-manager-setup">webPixelsConfigList:{},</script></head></html>"#,
            serde_json::to_string(&vec![entry]).unwrap()
        )
    }

    #[test]
    fn test_google_app_ids_bucketed_by_prefix() {
        let html = google_app_html();
        let result = detect_shopify_pixels(&html);
        assert_eq!(result.ga4_ids, vec!["G-ABC1234567"]);
        // The second AW- ID only exists inside an action label
        assert_eq!(result.ads_ids, vec!["AW-9876543210", "AW-1112223334"]);
        assert_eq!(result.gtag_event_types, vec!["purchase", "add_to_cart"]);
    }

    #[test]
    fn test_api_client_id_mapped_to_app_name() {
        let html = google_app_html();
        let result = detect_shopify_pixels(&html);
        assert!(result
            .info
            .apps_detected
            .contains(&"Google & YouTube".to_string()));
        assert!(result.info.has_web_pixels_manager);
        assert!(result.info.is_shopify);
    }

    #[test]
    fn test_facebook_app_synthesizes_standard_events() {
        let configuration =
            r#"{"pixel_id":"1234567890123456","pixel_type":"facebook_pixel"}"#;
        let entry = serde_json::json!({
            "id": "shopify-app-pixel-2",
            "apiClientId": 2329312,
            "configuration": configuration,
        });
        let html = format!(
            r#"<script>webPixelsConfigList:{}</script><script src="https://cdn.shopify.com/web-pixels-manager.js"></script>"#,
            serde_json::to_string(&vec![entry]).unwrap()
        );
        let result = detect_shopify_pixels(&html);
        assert_eq!(result.synthesized_meta_events.len(), 7);
        assert!(result
            .synthesized_meta_events
            .contains(&"Purchase".to_string()));
    }

    #[test]
    fn test_tiktok_pixel_code_collected() {
        let configuration = r#"{"pixel_code":"CABC123DEF456"}"#;
        let entry = serde_json::json!({
            "id": "shopify-app-pixel-3",
            "apiClientId": 6167201,
            "configuration": configuration,
        });
        let html = format!(
            "<script>webPixelsConfigList:{}</script>",
            serde_json::to_string(&vec![entry]).unwrap()
        );
        let result = detect_shopify_pixels(&html);
        assert_eq!(result.info.tiktok_pixel_ids, vec!["CABC123DEF456"]);
    }

    #[test]
    fn test_broken_configuration_falls_back_to_flat_scan() {
        // configuration is truncated mid-string: level-2 parse fails, but
        // the flat scan still recovers the measurement ID
        let html = r#"<script>webPixelsConfigList:[{"id":"p1","configuration":"{\"config\":\"{\\\"google_tag_ids\\\":[\\\"G-ABC1234567\\\"]"}]</script>"#;
        let result = detect_shopify_pixels(html);
        assert_eq!(result.ga4_ids, vec!["G-ABC1234567"]);
    }

    #[test]
    fn test_broken_list_falls_back_to_page_scan() {
        let html = r#"
            <script src="https://cdn.shopify.com/shopifycloud/web-pixels-manager/0.0.1/sandbox.js"></script>
            <script>webPixelsConfigList:[{{{ not json at all</script>
            <script>var ids = ["G-ABC1234567"];</script>
        "#;
        let result = detect_shopify_pixels(html);
        assert_eq!(result.ga4_ids, vec!["G-ABC1234567"]);
        assert!(result.info.is_shopify);
    }

    #[test]
    fn test_non_shopify_page_is_empty() {
        let result = detect_shopify_pixels("<html><body>plain page</body></html>");
        assert_eq!(result, ShopifyPixelsResult::default());
    }

    #[test]
    fn test_storefront_fingerprint_without_pixels() {
        let html = r#"<script src="https://monorail-edge.shopifysvc.com/v1/produce"></script>"#;
        let result = detect_shopify_pixels(html);
        assert!(result.info.is_shopify);
        assert!(!result.info.has_web_pixels_manager);
        assert!(result.ga4_ids.is_empty());
    }
}
