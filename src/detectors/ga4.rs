//! Google Analytics 4 detection.
//!
//! Collects `G-` measurement IDs from the combined page+script content via an
//! ordered pattern battery, then checks install consistency: a loaded gtag
//! script should be paired with a `gtag('config', ...)` call and vice versa.

use std::sync::LazyLock;

use regex::Regex;

use super::config::GA4_PROFILE;
use super::{
    collect_candidates, combined_content, compile_pattern, site_authored_content,
    validate_candidates,
};
use crate::models::{DetectorResult, ScriptInfo};

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // gtag.js loader URL
        r#"(?i)googletagmanager\.com/gtag/js\?[^"'\s>]*\bid=(G-[A-Z0-9]+)"#,
        // gtag('config', 'G-...')
        r#"(?i)gtag\s*\(\s*['"]config['"]\s*,\s*['"](G-[A-Z0-9]+)['"]"#,
        // gtag('get', 'G-...')
        r#"(?i)gtag\s*\(\s*['"]get['"]\s*,\s*['"](G-[A-Z0-9]+)['"]"#,
        // measurement_id / measurementId JSON keys (also inside escaped JSON)
        r#"(?i)\\?['"]?measurement_?id\\?['"]?\s*:\s*\\?['"](G-[A-Z0-9]+)\\?['"]"#,
        // JS variable assignment
        r#"(?i)(?:measurementId|ga4Id|gaMeasurementId|GA_MEASUREMENT_ID)\s*=\s*['"](G-[A-Z0-9]+)['"]"#,
        // generic analytics config keys
        r#"(?i)['"](?:ga4_id|google_analytics_id|analytics_id)['"]\s*:\s*['"](G-[A-Z0-9]+)['"]"#,
        // send_to routing targets
        r#"(?i)['"]?send_to['"]?\s*:\s*['"](G-[A-Z0-9]+)['"]"#,
        // data-* attributes
        r#"(?i)data-(?:measurement-id|ga4-id)\s*=\s*['"](G-[A-Z0-9]+)['"]"#,
        // bare quoted ID, the catch-all; validation filters the noise
        r#"['"](G-[A-Z0-9]{8,14})['"]"#,
    ]
    .iter()
    .map(|p| compile_pattern(p, "GA4 ID_PATTERNS"))
    .collect()
});

static LOADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(r"(?i)googletagmanager\.com/gtag/js", "GA4 LOADER_PATTERN"));

static CONFIG_CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"(?i)gtag\s*\(\s*['"]config['"]\s*,\s*['"]G-"#,
        "GA4 CONFIG_CALL_PATTERN",
    )
});

static GTAG_DEFINITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r"function\s+gtag\s*\(|(?:window\.)?gtag\s*=\s*function",
        "GA4 GTAG_DEFINITION_PATTERN",
    )
});

/// Error code: more than one GA4 measurement ID is configured.
pub const MULTIPLE_GA4_IDS: &str = "multiple_ga4_ids";
/// Error code: gtag.js is loaded but no `gtag('config', 'G-...')` call exists.
pub const GA4_SCRIPT_WITHOUT_CONFIG: &str = "ga4_script_without_config";
/// Error code: a config call exists but the gtag.js loader is missing.
pub const GA4_CONFIG_WITHOUT_SCRIPT: &str = "ga4_config_without_script";
/// Error code: the `gtag` base function is defined more than once.
pub const MULTIPLE_GTAG_DEFINITIONS: &str = "multiple_gtag_definitions";

/// Detects GA4 installation and configuration problems.
///
/// Pure and synchronous; identical input yields an identical result.
pub fn detect_ga4(html: &str, scripts: &[ScriptInfo]) -> DetectorResult {
    let all_content = combined_content(html, scripts);

    let patterns: Vec<&Regex> = ID_PATTERNS.iter().collect();
    let candidates = collect_candidates(&patterns, &all_content);
    let ids = validate_candidates(&GA4_PROFILE, &candidates);

    let detected = !ids.is_empty();
    let mut errors = Vec::new();

    if detected {
        let has_loader = LOADER_PATTERN.is_match(&all_content);
        let has_config = CONFIG_CALL_PATTERN.is_match(&all_content);

        if ids.len() > 1 {
            errors.push(MULTIPLE_GA4_IDS.to_string());
        }
        if has_loader && !has_config {
            errors.push(GA4_SCRIPT_WITHOUT_CONFIG.to_string());
        }
        if has_config && !has_loader {
            errors.push(GA4_CONFIG_WITHOUT_SCRIPT.to_string());
        }

        let site_content = site_authored_content(html, scripts);
        if GTAG_DEFINITION_PATTERN.find_iter(&site_content).count() > 1 {
            errors.push(MULTIPLE_GTAG_DEFINITIONS.to_string());
        }
    }

    log::debug!(
        "GA4 detection: detected={} ids={:?} errors={:?}",
        detected,
        ids,
        errors
    );

    DetectorResult {
        detected,
        ids,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_INSTALL: &str = r#"
        <script async src="https://www.googletagmanager.com/gtag/js?id=G-ABC1234567"></script>
        <script>
          window.dataLayer = window.dataLayer || [];
          function gtag(){dataLayer.push(arguments);}
          gtag('js', new Date());
          gtag('config', 'G-ABC1234567');
        </script>
    "#;

    #[test]
    fn test_full_install_detected_without_errors() {
        let result = detect_ga4(FULL_INSTALL, &[]);
        assert!(result.detected);
        assert_eq!(result.ids, vec!["G-ABC1234567"]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_script_without_config() {
        let html = r#"<script src="https://www.googletagmanager.com/gtag/js?id=G-ABC1234567"></script>"#;
        let result = detect_ga4(html, &[]);
        assert!(result.detected);
        assert!(result.errors.contains(&GA4_SCRIPT_WITHOUT_CONFIG.to_string()));
    }

    #[test]
    fn test_config_without_script() {
        let html = r#"<script>gtag('config', 'G-ABC1234567');</script>"#;
        let result = detect_ga4(html, &[]);
        assert!(result.detected);
        assert!(result.errors.contains(&GA4_CONFIG_WITHOUT_SCRIPT.to_string()));
    }

    #[test]
    fn test_multiple_ids() {
        let html = r#"
            <script src="https://www.googletagmanager.com/gtag/js?id=G-ABC1234567"></script>
            <script>
              gtag('config', 'G-ABC1234567');
              gtag('config', 'G-DEF7654321');
            </script>
        "#;
        let result = detect_ga4(html, &[]);
        assert_eq!(result.ids.len(), 2);
        assert!(result.errors.contains(&MULTIPLE_GA4_IDS.to_string()));
    }

    #[test]
    fn test_multiple_gtag_definitions_counted_in_site_content_only() {
        let html = r#"
            <script src="https://www.googletagmanager.com/gtag/js?id=G-ABC1234567"></script>
            <script>function gtag(){dataLayer.push(arguments);} gtag('config', 'G-ABC1234567');</script>
            <script>function gtag(){dataLayer.push(arguments);}</script>
        "#;
        let result = detect_ga4(html, &[]);
        assert!(result.errors.contains(&MULTIPLE_GTAG_DEFINITIONS.to_string()));

        // The same second definition inside a vendor script must not count
        let vendor = ScriptInfo {
            content: "function gtag(){dataLayer.push(arguments);}".into(),
            ..ScriptInfo::external("https://www.googletagmanager.com/gtag/js?id=G-ABC1234567")
        };
        let html_single = r#"
            <script src="https://www.googletagmanager.com/gtag/js?id=G-ABC1234567"></script>
            <script>function gtag(){dataLayer.push(arguments);} gtag('config', 'G-ABC1234567');</script>
        "#;
        let result = detect_ga4(html_single, &[vendor]);
        assert!(!result.errors.contains(&MULTIPLE_GTAG_DEFINITIONS.to_string()));
    }

    #[test]
    fn test_recaptcha_never_detected() {
        let html = r#"<script>var k = 'G-RECAPTCHA'; render('G-XXXXXXXXXX');</script>"#;
        let result = detect_ga4(html, &[]);
        assert!(!result.detected);
        assert!(result.ids.is_empty());
    }

    #[test]
    fn test_measurement_id_in_external_script() {
        let container = ScriptInfo {
            content: r#"{"measurement_id":"G-ZYX9876543"}"#.into(),
            ..ScriptInfo::external("https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD")
        };
        let result = detect_ga4("<html></html>", &[container]);
        assert!(result.detected);
        assert_eq!(result.ids, vec!["G-ZYX9876543"]);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let first = detect_ga4(FULL_INSTALL, &[]);
        let second = detect_ga4(FULL_INSTALL, &[]);
        assert_eq!(first, second);
    }
}
