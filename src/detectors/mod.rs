//! Per-platform tag detectors.
//!
//! Each detector is a pure, synchronous function over the page HTML and the
//! unified script list: an ordered battery of regex patterns collects raw
//! candidate IDs, a [`config::DetectionProfile`] filters false positives,
//! and install/config-consistency rules turn structural problems into
//! closed-vocabulary error codes.

pub mod config;
mod ga4;
mod google_ads;
mod gtm;
mod meta_pixel;
mod shopify;

use std::collections::HashSet;

use regex::Regex;
use strum_macros::{Display, EnumIter};

use crate::models::ScriptInfo;

pub use ga4::{
    detect_ga4, GA4_CONFIG_WITHOUT_SCRIPT, GA4_SCRIPT_WITHOUT_CONFIG, MULTIPLE_GA4_IDS,
    MULTIPLE_GTAG_DEFINITIONS,
};
pub use google_ads::{detect_google_ads, ADS_CONFIG_WITHOUT_SCRIPT, ADS_SCRIPT_WITHOUT_CONFIG};
pub use gtm::{
    detect_gtm, DATALAYER_INITIALIZED_MULTIPLE_TIMES, DATALAYER_NOT_INITIALIZED,
    GTM_LOADED_MULTIPLE_TIMES, GTM_NOSCRIPT_MISSING,
};
pub use meta_pixel::{
    detect_meta_pixel, DUPLICATE_PIXEL_INIT, MULTIPLE_FBQ_DEFINITIONS, MULTIPLE_PIXEL_IDS,
    PIXEL_ID_NOT_FOUND, PIXEL_INIT_WITHOUT_SCRIPT, PIXEL_NOSCRIPT_MISSING,
    PIXEL_SCRIPT_WITHOUT_INIT,
};
pub use shopify::{detect_shopify_pixels, ShopifyPixelsResult, SHOPIFY_META_APP_EVENTS};

/// The platforms this crate can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TagPlatform {
    /// Google Analytics 4.
    #[strum(serialize = "GA4")]
    Ga4,
    /// Google Tag Manager.
    #[strum(serialize = "GTM")]
    Gtm,
    /// Meta (Facebook) Pixel.
    #[strum(serialize = "MetaPixel")]
    MetaPixel,
    /// Google Ads conversion tag.
    #[strum(serialize = "GoogleAds")]
    GoogleAds,
    /// Shopify Web Pixels.
    #[strum(serialize = "ShopifyPixels")]
    ShopifyPixels,
}

/// Concatenates the page HTML with every script's content into one search
/// string. Detectors match against this combined view so an ID is found no
/// matter whether it lives in markup, an inline snippet, or a downloaded
/// container.
pub fn combined_content(html: &str, scripts: &[ScriptInfo]) -> String {
    let mut all = String::with_capacity(
        html.len() + scripts.iter().map(|s| s.content.len() + 1).sum::<usize>(),
    );
    all.push_str(html);
    for script in scripts {
        if !script.content.is_empty() {
            all.push('\n');
            all.push_str(&script.content);
        }
    }
    all
}

/// Concatenates the page HTML with inline script bodies only.
///
/// "Defined more than once" rules must count definitions the site authored,
/// never the vendor's own external script content (which legitimately
/// defines the base function).
pub fn site_authored_content(html: &str, scripts: &[ScriptInfo]) -> String {
    let mut all = String::from(html);
    for script in scripts {
        if script.src.is_none() && !script.content.is_empty() {
            all.push('\n');
            all.push_str(&script.content);
        }
    }
    all
}

/// Runs a battery of patterns over `text`, collecting first-capture-group
/// matches in pattern order with order-preserving dedup of the raw text.
pub(crate) fn collect_candidates(patterns: &[&Regex], text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for pattern in patterns {
        for cap in pattern.captures_iter(text) {
            if let Some(id) = cap.get(1) {
                let raw = id.as_str().to_string();
                if seen.insert(raw.to_ascii_uppercase()) {
                    candidates.push(raw);
                }
            }
        }
    }
    candidates
}

/// Validates raw candidates against a profile, preserving order and
/// deduplicating the normalized form.
pub(crate) fn validate_candidates(
    profile: &config::DetectionProfile,
    candidates: &[String],
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();
    for raw in candidates {
        if let Some(id) = profile.validate(raw) {
            if seen.insert(id.clone()) {
                accepted.push(id);
            }
        }
    }
    accepted
}

/// Compiles a static regex, panicking with a detailed message on failure.
/// Used for pattern constants only.
pub(crate) fn compile_pattern(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static TEST_PATTERN_A: LazyLock<Regex> =
        LazyLock::new(|| compile_pattern(r"id=(G-[A-Z0-9]+)", "TEST_PATTERN_A"));
    static TEST_PATTERN_B: LazyLock<Regex> =
        LazyLock::new(|| compile_pattern(r"'(G-[A-Z0-9]+)'", "TEST_PATTERN_B"));

    #[test]
    fn test_collect_candidates_dedups_across_patterns() {
        let text = "id=G-ABC1234567 then 'G-ABC1234567' and 'G-DEF7654321'";
        let candidates = collect_candidates(&[&*TEST_PATTERN_A, &*TEST_PATTERN_B], text);
        assert_eq!(candidates, vec!["G-ABC1234567", "G-DEF7654321"]);
    }

    #[test]
    fn test_combined_content_includes_external_script_bodies() {
        let scripts = vec![
            ScriptInfo::inline("var a = 1;"),
            ScriptInfo {
                content: "var b = 2;".into(),
                ..ScriptInfo::external("https://example.com/b.js")
            },
        ];
        let all = combined_content("<html></html>", &scripts);
        assert!(all.contains("var a = 1;"));
        assert!(all.contains("var b = 2;"));
    }

    #[test]
    fn test_site_authored_content_excludes_external_bodies() {
        let scripts = vec![
            ScriptInfo::inline("var a = 1;"),
            ScriptInfo {
                content: "var b = 2;".into(),
                ..ScriptInfo::external("https://example.com/b.js")
            },
        ];
        let site = site_authored_content("<html></html>", &scripts);
        assert!(site.contains("var a = 1;"));
        assert!(!site.contains("var b = 2;"));
    }

    #[test]
    fn test_platform_display_names() {
        assert_eq!(TagPlatform::Ga4.to_string(), "GA4");
        assert_eq!(TagPlatform::ShopifyPixels.to_string(), "ShopifyPixels");
    }
}
