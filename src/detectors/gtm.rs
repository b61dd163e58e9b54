//! Google Tag Manager detection.
//!
//! Collects `GTM-` container IDs and checks the install around them: the
//! `<noscript>` iframe fallback, dataLayer initialization, and duplicate
//! loading of the same container.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::config::GTM_PROFILE;
use super::{
    collect_candidates, combined_content, compile_pattern, site_authored_content,
    validate_candidates,
};
use crate::models::{GtmResult, ScriptInfo};

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // gtm.js loader URL
        r#"(?i)googletagmanager\.com/gtm\.js\?[^"'\s>]*\bid=(GTM-[A-Z0-9]+)"#,
        // noscript iframe fallback URL
        r#"(?i)googletagmanager\.com/ns\.html\?[^"'\s>]*\bid=(GTM-[A-Z0-9]+)"#,
        // classic snippet tail: ...'dataLayer','GTM-XXXX')
        r#"(?i)['"]dataLayer['"]\s*,\s*['"](GTM-[A-Z0-9]+)['"]"#,
        // id= query parameter on any URL
        r#"(?i)[?&]id=(GTM-[A-Z0-9]+)"#,
        // container_id JSON keys (also inside escaped JSON)
        r#"(?i)\\?['"]?container_?id\\?['"]?\s*:\s*\\?['"](GTM-[A-Z0-9]+)\\?['"]"#,
        // data-* attributes
        r#"(?i)data-(?:gtm-)?container-id\s*=\s*['"](GTM-[A-Z0-9]+)['"]"#,
        // google_tag_manager['GTM-XXXX'] runtime accessor
        r#"(?i)google_tag_manager\[['"](GTM-[A-Z0-9]+)['"]\]"#,
        // bare quoted container ID
        r#"['"](GTM-[A-Z0-9]{4,10})['"]"#,
    ]
    .iter()
    .map(|p| compile_pattern(p, "GTM ID_PATTERNS"))
    .collect()
});

static NOSCRIPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r"(?i)googletagmanager\.com/ns\.html",
        "GTM NOSCRIPT_PATTERN",
    )
});

static DATALAYER_INIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r"(?:window\.)?dataLayer\s*=\s*(?:window\.dataLayer\s*\|\|\s*)?\[",
        "GTM DATALAYER_INIT_PATTERN",
    )
});

static LOADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"(?i)googletagmanager\.com/gtm\.js\?[^"'\s>]*\bid=(GTM-[A-Z0-9]+)"#,
        "GTM LOADER_PATTERN",
    )
});

/// Error code: no `<noscript>` iframe fallback for the container.
pub const GTM_NOSCRIPT_MISSING: &str = "gtm_noscript_missing";
/// Error code: the dataLayer is never initialized.
pub const DATALAYER_NOT_INITIALIZED: &str = "datalayer_not_initialized";
/// Error code: the dataLayer is initialized more than once, which resets it.
pub const DATALAYER_INITIALIZED_MULTIPLE_TIMES: &str = "datalayer_initialized_multiple_times";
/// Error code: more loader snippets than distinct containers (the same
/// container is loaded repeatedly).
pub const GTM_LOADED_MULTIPLE_TIMES: &str = "gtm_loaded_multiple_times";

/// Detects GTM containers and install problems around them.
///
/// Pure and synchronous; identical input yields an identical result.
pub fn detect_gtm(html: &str, scripts: &[ScriptInfo]) -> GtmResult {
    let all_content = combined_content(html, scripts);
    let site_content = site_authored_content(html, scripts);

    let patterns: Vec<&Regex> = ID_PATTERNS.iter().collect();
    let candidates = collect_candidates(&patterns, &all_content);
    let containers = validate_candidates(&GTM_PROFILE, &candidates);

    let detected = !containers.is_empty();
    let mut errors = Vec::new();

    if detected {
        if !NOSCRIPT_PATTERN.is_match(html) {
            errors.push(GTM_NOSCRIPT_MISSING.to_string());
        }

        let init_count = DATALAYER_INIT_PATTERN.find_iter(&site_content).count();
        if init_count == 0 {
            errors.push(DATALAYER_NOT_INITIALIZED.to_string());
        } else if init_count > 1 {
            errors.push(DATALAYER_INITIALIZED_MULTIPLE_TIMES.to_string());
        }

        // Loader snippets are site-authored markup; counting the combined
        // content would double-count references inside the container body.
        let mut loader_count = 0usize;
        let mut loader_ids = HashSet::new();
        for cap in LOADER_PATTERN.captures_iter(&site_content) {
            loader_count += 1;
            if let Some(id) = cap.get(1) {
                loader_ids.insert(id.as_str().to_ascii_uppercase());
            }
        }
        if loader_count > loader_ids.len() {
            errors.push(GTM_LOADED_MULTIPLE_TIMES.to_string());
        }
    }

    log::debug!(
        "GTM detection: detected={} containers={:?} errors={:?}",
        detected,
        containers,
        errors
    );

    GtmResult {
        detected,
        containers,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_INSTALL: &str = r#"
        <head>
        <script>window.dataLayer = window.dataLayer || [];</script>
        <script>(function(w,d,s,l,i){w[l]=w[l]||[];w[l].push({'gtm.start':
        new Date().getTime(),event:'gtm.js'});var f=d.getElementsByTagName(s)[0],
        j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;j.src=
        'https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);
        })(window,document,'script','dataLayer','GTM-AB12CD');</script>
        </head>
        <body>
        <noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-AB12CD"
        height="0" width="0" style="display:none;visibility:hidden"></iframe></noscript>
        </body>
    "#;

    #[test]
    fn test_full_install_detected_without_errors() {
        let result = detect_gtm(FULL_INSTALL, &[]);
        assert!(result.detected);
        assert_eq!(result.containers, vec!["GTM-AB12CD"]);
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    }

    #[test]
    fn test_noscript_missing() {
        let html = r#"
            <script>window.dataLayer = window.dataLayer || [];</script>
            <script src="https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD"></script>
        "#;
        let result = detect_gtm(html, &[]);
        assert!(result.detected);
        assert!(result.errors.contains(&GTM_NOSCRIPT_MISSING.to_string()));
    }

    #[test]
    fn test_datalayer_not_initialized() {
        let html = r#"<script src="https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD"></script>"#;
        let result = detect_gtm(html, &[]);
        assert!(result
            .errors
            .contains(&DATALAYER_NOT_INITIALIZED.to_string()));
    }

    #[test]
    fn test_datalayer_initialized_multiple_times() {
        let html = r#"
            <script>window.dataLayer = window.dataLayer || [];</script>
            <script>var dataLayer = [];</script>
            <script src="https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD"></script>
        "#;
        let result = detect_gtm(html, &[]);
        assert!(result
            .errors
            .contains(&DATALAYER_INITIALIZED_MULTIPLE_TIMES.to_string()));
    }

    #[test]
    fn test_same_container_loaded_twice() {
        let html = r#"
            <script>window.dataLayer = window.dataLayer || [];</script>
            <script src="https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD"></script>
            <script src="https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD"></script>
            <noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-AB12CD"></iframe></noscript>
        "#;
        let result = detect_gtm(html, &[]);
        assert!(result
            .errors
            .contains(&GTM_LOADED_MULTIPLE_TIMES.to_string()));
    }

    #[test]
    fn test_two_distinct_containers_are_not_duplicates() {
        let html = r#"
            <script>window.dataLayer = window.dataLayer || [];</script>
            <script src="https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD"></script>
            <script src="https://www.googletagmanager.com/gtm.js?id=GTM-ZY98XW"></script>
            <noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-AB12CD"></iframe></noscript>
        "#;
        let result = detect_gtm(html, &[]);
        assert_eq!(result.containers.len(), 2);
        assert!(!result
            .errors
            .contains(&GTM_LOADED_MULTIPLE_TIMES.to_string()));
    }

    #[test]
    fn test_placeholder_container_rejected() {
        let html = r#"<script src="https://www.googletagmanager.com/gtm.js?id=GTM-XXXXXX"></script>"#;
        let result = detect_gtm(html, &[]);
        assert!(!result.detected);
    }
}
