//! Event call-site extraction.
//!
//! Three independent scanners (GA4, GTM, Meta Pixel) walk the site-authored
//! JS content for event-firing call sites and pull each call's parameter
//! object through the literal extractor. The page HTML is consulted only
//! for noscript/URL signals. All scanners share one capping collector.

use std::sync::LazyLock;

use regex::Regex;

use super::EventCollector;
use crate::detectors::compile_pattern;
use crate::js_parsing::{extract_object_literal, parse_params};
use crate::models::{EventPlatform, EventRecord, ScriptInfo};

static GTAG_EVENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"gtag\s*\(\s*['"]event['"]\s*,\s*['"]([^'"]+)['"]"#,
        "events GTAG_EVENT_PATTERN",
    )
});

static DATALAYER_PUSH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(r"dataLayer\.push\s*\(\s*\{", "events DATALAYER_PUSH_PATTERN")
});

static SNAKE_CASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)+$",
        "events SNAKE_CASE_PATTERN",
    )
});

static FBQ_TRACK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"fbq\s*\(\s*['"](track|trackCustom)['"]\s*,\s*['"]([^'"]+)['"]"#,
        "events FBQ_TRACK_PATTERN",
    )
});

static FB_TR_PAGEVIEW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r"(?i)facebook\.com/tr\?[^\x22'\s>]*\bev=PageView",
        "events FB_TR_PAGEVIEW_PATTERN",
    )
});

/// Tokens that appear where an event name would but are not events.
const RESERVED_FBQ_TOKENS: &[&str] = &[
    "init",
    "track",
    "trackCustom",
    "trackSingle",
    "consent",
    "set",
    "dataProcessingOptions",
    "true",
    "false",
];

/// Extracts event-firing call sites from the page.
///
/// # Arguments
///
/// * `html` - The page HTML (noscript/URL signals only)
/// * `scripts` - The unified script list; externals marked
///   `exclude_from_events` contribute nothing
///
/// # Returns
///
/// Extracted records in scanner order (GA4, GTM, Meta Pixel), capped per
/// `(platform, name)` key.
pub fn extract_events(html: &str, scripts: &[ScriptInfo]) -> Vec<EventRecord> {
    let js = event_analysis_content(scripts);
    let mut collector = EventCollector::new();

    scan_ga4_events(&js, &mut collector);
    scan_gtm_events(&js, &mut collector);
    scan_meta_events(&js, html, &mut collector);

    collector.into_events()
}

/// Joins inline scripts and non-excluded external script contents into the
/// one JS string the scanners run over.
fn event_analysis_content(scripts: &[ScriptInfo]) -> String {
    let mut js = String::new();
    for script in scripts {
        if script.exclude_from_events || script.content.is_empty() {
            continue;
        }
        js.push_str(&script.content);
        js.push('\n');
    }
    js
}

/// Pulls the parameter literal that follows a call-site match, if the next
/// argument is an inline object. Looks past one comma only, so a literal
/// belonging to the *next* call is never claimed by an argument-less call.
fn params_after(js: &str, match_end: usize) -> serde_json::Map<String, serde_json::Value> {
    let rest = &js[match_end..];
    let trimmed = rest.trim_start();
    let after_comma = match trimmed.strip_prefix(',') {
        Some(after) => after.trim_start(),
        None => return serde_json::Map::new(),
    };
    if !after_comma.starts_with('{') {
        return serde_json::Map::new();
    }
    match extract_object_literal(after_comma, 0) {
        Some(literal) => parse_params(literal),
        None => serde_json::Map::new(),
    }
}

fn scan_ga4_events(js: &str, collector: &mut EventCollector) {
    for cap in GTAG_EVENT_PATTERN.captures_iter(js) {
        let name = cap[1].to_string();
        let params = params_after(js, cap.get(0).map(|m| m.end()).unwrap_or(0));
        collector.push(EventRecord {
            platform: EventPlatform::Ga4,
            name,
            params,
        });
    }

    // Secondary heuristic: sites running GA4 through GTM push snake_case
    // event names straight onto the dataLayer.
    for site in DATALAYER_PUSH_PATTERN.find_iter(js) {
        let Some(literal) = extract_object_literal(js, site.end() - 1) else {
            continue;
        };
        let mut params = parse_params(literal);
        let Some(name) = params.get("event").and_then(|v| v.as_str()).map(String::from) else {
            continue;
        };
        if SNAKE_CASE_PATTERN.is_match(&name) {
            params.remove("event");
            collector.push(EventRecord {
                platform: EventPlatform::Ga4,
                name,
                params,
            });
        }
    }
}

fn scan_gtm_events(js: &str, collector: &mut EventCollector) {
    for site in DATALAYER_PUSH_PATTERN.find_iter(js) {
        let Some(literal) = extract_object_literal(js, site.end() - 1) else {
            continue;
        };
        let mut params = parse_params(literal);
        let Some(name) = params.get("event").and_then(|v| v.as_str()).map(String::from) else {
            continue;
        };
        params.remove("event");
        collector.push(EventRecord {
            platform: EventPlatform::Gtm,
            name,
            params,
        });
    }
}

fn scan_meta_events(js: &str, html: &str, collector: &mut EventCollector) {
    for cap in FBQ_TRACK_PATTERN.captures_iter(js) {
        let raw_name = cap[2].to_string();
        if RESERVED_FBQ_TOKENS.contains(&raw_name.as_str()) {
            continue;
        }
        // Template placeholders are tag-manager variables resolved at
        // runtime; keep them visible instead of dropping the event.
        let name = if raw_name.contains("{{") {
            format!("[Dynamic] {}", raw_name)
        } else {
            raw_name
        };
        let params = params_after(js, cap.get(0).map(|m| m.end()).unwrap_or(0));
        collector.push(EventRecord {
            platform: EventPlatform::MetaPixel,
            name,
            params,
        });
    }

    // A noscript/URL beacon fires PageView without any fbq call
    if FB_TR_PAGEVIEW_PATTERN.is_match(html)
        && !collector.contains_key(EventPlatform::MetaPixel, "PageView")
    {
        collector.push(EventRecord::new(EventPlatform::MetaPixel, "PageView"));
    }

    // WooCommerce Pixel Manager wires PageView up through its own dataLayer
    if js.contains("wpmDataLayer")
        && js.contains("pixel_id")
        && !collector.contains_key(EventPlatform::MetaPixel, "PageView")
    {
        collector.push(EventRecord::new(EventPlatform::MetaPixel, "PageView"));
    }
}
