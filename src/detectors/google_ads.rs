//! Google Ads conversion tag detection.
//!
//! Collects `AW-` conversion IDs, normalizes bare numeric conversion IDs
//! from legacy snippets, and surfaces `send_to` conversion-linker strings
//! separately so callers can see which conversion actions are wired up.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::config::GOOGLE_ADS_PROFILE;
use super::{collect_candidates, combined_content, compile_pattern, validate_candidates};
use crate::models::{GoogleAdsResult, ScriptInfo};

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // gtag.js loader URL carrying an AW- ID
        r#"(?i)googletagmanager\.com/gtag/js\?[^"'\s>]*\bid=(AW-[0-9]+)"#,
        // gtag('config', 'AW-...')
        r#"(?i)gtag\s*\(\s*['"]config['"]\s*,\s*['"](AW-[0-9]+)['"]"#,
        // send_to target, stripped to the conversion ID part
        r#"(?i)['"]?send_to['"]?\s*:\s*['"](AW-[0-9]+)"#,
        // legacy conversion loader URL
        r#"(?i)googleadservices\.com/pagead/conversion/([0-9]{9,11})"#,
        // legacy google_conversion_id assignment (bare numeric)
        r#"(?i)google_conversion_id\s*[:=]\s*['"]?([0-9]{9,11})"#,
        // JSON config keys
        r#"(?i)['"](?:aw_?id|google_ads_id|conversion_id)['"]\s*:\s*['"](AW-[0-9]+)['"]"#,
        // data-* attributes
        r#"(?i)data-(?:aw-id|conversion-id)\s*=\s*['"](AW-[0-9]+)['"]"#,
        // bare quoted AW- ID
        r#"['"](AW-[0-9]{9,11})['"]"#,
    ]
    .iter()
    .map(|p| compile_pattern(p, "GoogleAds ID_PATTERNS"))
    .collect()
});

static SEND_TO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"(?i)['"]?send_to['"]?\s*:\s*['"](AW-[0-9]+(?:/[A-Za-z0-9_-]+)?)['"]"#,
        "GoogleAds SEND_TO_PATTERN",
    )
});

static LOADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r"(?i)googletagmanager\.com/gtag/js|googleadservices\.com/pagead/conversion",
        "GoogleAds LOADER_PATTERN",
    )
});

static CONFIG_CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"(?i)gtag\s*\(\s*['"]config['"]\s*,\s*['"]AW-"#,
        "GoogleAds CONFIG_CALL_PATTERN",
    )
});

/// Error code: a gtag/conversion loader exists but no `AW-` config call.
pub const ADS_SCRIPT_WITHOUT_CONFIG: &str = "ads_script_without_config";
/// Error code: an `AW-` config call exists but no loader script.
pub const ADS_CONFIG_WITHOUT_SCRIPT: &str = "ads_config_without_script";

/// Detects Google Ads conversion tags.
///
/// Pure and synchronous; identical input yields an identical result.
pub fn detect_google_ads(html: &str, scripts: &[ScriptInfo]) -> GoogleAdsResult {
    let all_content = combined_content(html, scripts);

    let patterns: Vec<&Regex> = ID_PATTERNS.iter().collect();
    let candidates: Vec<String> = collect_candidates(&patterns, &all_content)
        .into_iter()
        // Bare numeric conversion IDs from legacy snippets normalize to AW- form
        .map(|raw| {
            if raw.chars().all(|c| c.is_ascii_digit()) {
                format!("AW-{}", raw)
            } else {
                raw
            }
        })
        .collect();
    let ids = validate_candidates(&GOOGLE_ADS_PROFILE, &candidates);

    let mut conversions = Vec::new();
    let mut seen_conversions = HashSet::new();
    for cap in SEND_TO_PATTERN.captures_iter(&all_content) {
        if let Some(target) = cap.get(1) {
            let target = target.as_str().to_string();
            if seen_conversions.insert(target.to_ascii_uppercase()) {
                conversions.push(target);
            }
        }
    }

    let detected = !ids.is_empty();
    let mut errors = Vec::new();

    if detected {
        let has_loader = LOADER_PATTERN.is_match(&all_content);
        let has_config = CONFIG_CALL_PATTERN.is_match(&all_content);
        if has_loader && !has_config {
            errors.push(ADS_SCRIPT_WITHOUT_CONFIG.to_string());
        }
        if has_config && !has_loader {
            errors.push(ADS_CONFIG_WITHOUT_SCRIPT.to_string());
        }
    }

    log::debug!(
        "Google Ads detection: detected={} ids={:?} conversions={:?} errors={:?}",
        detected,
        ids,
        conversions,
        errors
    );

    GoogleAdsResult {
        detected,
        ids,
        errors,
        conversions: if conversions.is_empty() {
            None
        } else {
            Some(conversions)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_install_detected_without_errors() {
        let html = r#"
            <script async src="https://www.googletagmanager.com/gtag/js?id=AW-11122233344"></script>
            <script>
              gtag('config', 'AW-11122233344');
              gtag('event', 'conversion', {'send_to': 'AW-11122233344/AbCdEfGhIj'});
            </script>
        "#;
        let result = detect_google_ads(html, &[]);
        assert!(result.detected);
        assert_eq!(result.ids, vec!["AW-11122233344"]);
        assert_eq!(
            result.conversions,
            Some(vec!["AW-11122233344/AbCdEfGhIj".to_string()])
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_loader_without_config() {
        let html = r#"<script src="https://www.googletagmanager.com/gtag/js?id=AW-11122233344"></script>"#;
        let result = detect_google_ads(html, &[]);
        assert!(result.detected);
        assert!(result
            .errors
            .contains(&ADS_SCRIPT_WITHOUT_CONFIG.to_string()));
    }

    #[test]
    fn test_config_without_loader() {
        let html = r#"<script>gtag('config', 'AW-11122233344');</script>"#;
        let result = detect_google_ads(html, &[]);
        assert!(result.detected);
        assert!(result
            .errors
            .contains(&ADS_CONFIG_WITHOUT_SCRIPT.to_string()));
    }

    #[test]
    fn test_bare_numeric_conversion_id_normalized() {
        let html = r#"
            <script src="https://www.googleadservices.com/pagead/conversion.js"></script>
            <script>var google_conversion_id = 9876543210;</script>
        "#;
        let result = detect_google_ads(html, &[]);
        assert!(result.detected);
        assert_eq!(result.ids, vec!["AW-9876543210"]);
    }

    #[test]
    fn test_conversions_absent_when_none_found() {
        let html = r#"<script>gtag('config', 'AW-11122233344');</script>"#;
        let result = detect_google_ads(html, &[]);
        assert_eq!(result.conversions, None);
    }

    #[test]
    fn test_placeholder_rejected() {
        let html = r#"<script>gtag('config', 'AW-123456789');</script>"#;
        let result = detect_google_ads(html, &[]);
        assert!(!result.detected);
    }
}
