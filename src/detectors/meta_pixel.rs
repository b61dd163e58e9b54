//! Meta (Facebook) Pixel detection.
//!
//! Pixel IDs are 10-20 digit numbers with no distinctive prefix, so the
//! battery leans on call sites (`fbq('init', ...)`), the loader URL, and the
//! noscript image. A pixel script with no extractable ID still counts as
//! detected: the ID may be computed at runtime, which the audit records as
//! the `pixel_id_not_found` error instead of a miss.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::config::META_PIXEL_PROFILE;
use super::{
    collect_candidates, combined_content, compile_pattern, site_authored_content,
    validate_candidates,
};
use crate::models::{DetectorResult, ScriptInfo};

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // fbq('init', '1234567890')
        r#"(?i)fbq\s*\(\s*['"]init['"]\s*,\s*['"]([0-9]{10,20})['"]"#,
        // fbq('init', 1234567890) -- unquoted
        r#"(?i)fbq\s*\(\s*['"]init['"]\s*,\s*([0-9]{10,20})\s*[,)]"#,
        // noscript image / URL signal
        r#"(?i)facebook\.com/tr\?[^"'\s>]*\bid=([0-9]{10,20})"#,
        // fbq('trackSingle', '1234567890', ...)
        r#"(?i)fbq\s*\(\s*['"]trackSingle(?:Custom)?['"]\s*,\s*['"]([0-9]{10,20})['"]"#,
        // pixel_id JSON keys (also matches escaped quotes in embedded JSON)
        r#"(?i)\\?['"]?pixel_?id\\?['"]?\s*:\s*\\?['"]?([0-9]{10,20})"#,
        // data-* attributes
        r#"(?i)data-pixel-id\s*=\s*['"]([0-9]{10,20})['"]"#,
        // legacy _fbq.push(['init', '1234567890'])
        r#"(?i)_fbq\.push\s*\(\s*\[\s*['"]init['"]\s*,\s*['"]([0-9]{10,20})['"]"#,
        // facebookPixelId style variable assignments
        r#"(?i)(?:facebook_?pixel_?id|fb_?pixel_?id)\s*[:=]\s*['"]([0-9]{10,20})['"]"#,
    ]
    .iter()
    .map(|p| compile_pattern(p, "MetaPixel ID_PATTERNS"))
    .collect()
});

static SCRIPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r"(?i)connect\.facebook\.net/[^\s'\x22>]*fbevents\.js|fbevents\.js",
        "MetaPixel SCRIPT_PATTERN",
    )
});

static INIT_CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(r#"(?i)fbq\s*\(\s*['"]init['"]"#, "MetaPixel INIT_CALL_PATTERN")
});

static INIT_WITH_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r#"(?i)fbq\s*\(\s*['"]init['"]\s*,\s*['"]?([0-9]{10,20})"#,
        "MetaPixel INIT_WITH_ID_PATTERN",
    )
});

static FBQ_DEFINITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(
        r"(?:[a-z]\.|window\.)?fbq\s*=\s*function|function\s+fbq\s*\(",
        "MetaPixel FBQ_DEFINITION_PATTERN",
    )
});

static NOSCRIPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(r"(?i)facebook\.com/tr\?", "MetaPixel NOSCRIPT_PATTERN")
});

/// Error code: pixel script present but no ID could be extracted.
pub const PIXEL_ID_NOT_FOUND: &str = "pixel_id_not_found";
/// Error code: more than one pixel ID initialized.
pub const MULTIPLE_PIXEL_IDS: &str = "multiple_pixel_ids";
/// Error code: fbevents.js is loaded but `fbq('init', ...)` never runs.
pub const PIXEL_SCRIPT_WITHOUT_INIT: &str = "pixel_script_without_init";
/// Error code: `fbq('init', ...)` runs but fbevents.js is never loaded.
pub const PIXEL_INIT_WITHOUT_SCRIPT: &str = "pixel_init_without_script";
/// Error code: the `fbq` base function is defined more than once.
pub const MULTIPLE_FBQ_DEFINITIONS: &str = "multiple_fbq_definitions";
/// Error code: no noscript `<img>` fallback.
pub const PIXEL_NOSCRIPT_MISSING: &str = "pixel_noscript_missing";
/// Error code: the same pixel ID is initialized more than once.
pub const DUPLICATE_PIXEL_INIT: &str = "duplicate_pixel_init";

/// Detects Meta Pixel installation and configuration problems.
///
/// Pure and synchronous; identical input yields an identical result.
pub fn detect_meta_pixel(html: &str, scripts: &[ScriptInfo]) -> DetectorResult {
    let all_content = combined_content(html, scripts);

    let patterns: Vec<&Regex> = ID_PATTERNS.iter().collect();
    let candidates = collect_candidates(&patterns, &all_content);
    let ids = validate_candidates(&META_PIXEL_PROFILE, &candidates);

    let script_found = SCRIPT_PATTERN.is_match(&all_content);
    let init_found = INIT_CALL_PATTERN.is_match(&all_content);

    // Documented exception: a loaded pixel script counts as detected even
    // with zero extractable IDs (the ID may be runtime-computed).
    let detected = !ids.is_empty() || script_found;
    let mut errors = Vec::new();

    if detected {
        if ids.is_empty() {
            errors.push(PIXEL_ID_NOT_FOUND.to_string());
        }
        if ids.len() > 1 {
            errors.push(MULTIPLE_PIXEL_IDS.to_string());
        }
        if script_found && !init_found {
            errors.push(PIXEL_SCRIPT_WITHOUT_INIT.to_string());
        }
        if init_found && !script_found {
            errors.push(PIXEL_INIT_WITHOUT_SCRIPT.to_string());
        }

        let site_content = site_authored_content(html, scripts);
        if FBQ_DEFINITION_PATTERN.find_iter(&site_content).count() > 1 {
            errors.push(MULTIPLE_FBQ_DEFINITIONS.to_string());
        }
        if !NOSCRIPT_PATTERN.is_match(html) {
            errors.push(PIXEL_NOSCRIPT_MISSING.to_string());
        }

        let mut init_counts: HashMap<String, usize> = HashMap::new();
        for cap in INIT_WITH_ID_PATTERN.captures_iter(&all_content) {
            if let Some(id) = cap.get(1) {
                *init_counts.entry(id.as_str().to_string()).or_default() += 1;
            }
        }
        if init_counts.values().any(|&count| count > 1) {
            errors.push(DUPLICATE_PIXEL_INIT.to_string());
        }
    }

    log::debug!(
        "Meta Pixel detection: detected={} ids={:?} errors={:?}",
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
