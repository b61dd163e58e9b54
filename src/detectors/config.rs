//! Detection profiles: the configuration data behind candidate validation.
//!
//! ID-shape regexes, false-positive sets, and the acceptance heuristics are
//! versioned configuration, kept separate from detector logic so they can be
//! extended without touching the pattern batteries.

use std::sync::LazyLock;

use regex::Regex;

/// Validation profile for one platform's tracking IDs.
///
/// A raw candidate is accepted only if it passes every check enabled here;
/// accepted IDs are upper-cased.
pub struct DetectionProfile {
    /// Strict shape the full ID must match (anchored, case-insensitive).
    pub id_shape: Regex,
    /// Length of the ID prefix, in bytes (e.g. 2 for `G-`).
    pub prefix_len: usize,
    /// Require at least one digit after the prefix.
    pub require_digit: bool,
    /// Reject candidates whose suffix is entirely letters.
    pub reject_all_letter_suffix: bool,
    /// Heuristic: reject candidates mixing upper- and lower-case letters
    /// after the prefix. Real Google IDs are consistently cased; mixed case
    /// usually means the match came from unrelated minified text. Judgment
    /// call inherited from production behavior, not a documented rule.
    pub reject_irregular_casing: bool,
    /// Closed set of shape-valid strings known not to be real IDs
    /// (stored upper-cased).
    pub false_positives: &'static [&'static str],
}

impl DetectionProfile {
    /// Runs the full validation chain over a raw candidate.
    ///
    /// # Returns
    ///
    /// The accepted, upper-cased ID, or `None` if any check fails.
    pub fn validate(&self, raw: &str) -> Option<String> {
        if !self.id_shape.is_match(raw) {
            return None;
        }
        let suffix = &raw[self.prefix_len.min(raw.len())..];
        if self.require_digit && !suffix.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        if self.reject_all_letter_suffix
            && !suffix.is_empty()
            && suffix.chars().all(|c| c.is_ascii_alphabetic())
        {
            return None;
        }
        if self.reject_irregular_casing {
            let has_upper = suffix.chars().any(|c| c.is_ascii_uppercase());
            let has_lower = suffix.chars().any(|c| c.is_ascii_lowercase());
            if has_upper && has_lower {
                return None;
            }
        }
        let normalized = raw.to_ascii_uppercase();
        if self.false_positives.contains(&normalized.as_str()) {
            return None;
        }
        Some(normalized)
    }
}

fn shape(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile ID shape '{}': {}. This is a programming error.",
            pattern, e
        )
    })
}

/// GA4 measurement IDs: `G-` followed by 6-14 alphanumerics.
pub static GA4_PROFILE: LazyLock<DetectionProfile> = LazyLock::new(|| DetectionProfile {
    id_shape: shape(r"(?i)^G-[A-Z0-9]{6,14}$"),
    prefix_len: 2,
    require_digit: true,
    reject_all_letter_suffix: true,
    reject_irregular_casing: true,
    false_positives: &["G-RECAPTCHA", "G-ANALYTICS", "G-XXXXXXXXXX", "G-00000000"],
});

/// GTM container IDs: `GTM-` followed by 4-10 alphanumerics.
pub static GTM_PROFILE: LazyLock<DetectionProfile> = LazyLock::new(|| DetectionProfile {
    id_shape: shape(r"(?i)^GTM-[A-Z0-9]{4,10}$"),
    prefix_len: 4,
    require_digit: true,
    reject_all_letter_suffix: true,
    reject_irregular_casing: false,
    false_positives: &["GTM-TEMPLATE", "GTM-XXXX", "GTM-XXXXXX", "GTM-XXXXXXX", "GTM-0000"],
});

/// Meta Pixel IDs: 10-20 digits.
pub static META_PIXEL_PROFILE: LazyLock<DetectionProfile> = LazyLock::new(|| DetectionProfile {
    id_shape: shape(r"^[0-9]{10,20}$"),
    prefix_len: 0,
    require_digit: true,
    reject_all_letter_suffix: false,
    reject_irregular_casing: false,
    false_positives: &["0000000000", "1234567890", "9999999999"],
});

/// Google Ads conversion IDs: `AW-` followed by 9-11 digits.
pub static GOOGLE_ADS_PROFILE: LazyLock<DetectionProfile> = LazyLock::new(|| DetectionProfile {
    id_shape: shape(r"(?i)^AW-[0-9]{9,11}$"),
    prefix_len: 3,
    require_digit: true,
    reject_all_letter_suffix: true,
    reject_irregular_casing: false,
    false_positives: &["AW-000000000", "AW-123456789", "AW-XXXXXXXXX"],
});

/// Google tag IDs found in Shopify web-pixel configs, per prefix bucket.
/// Shopify-sourced IDs get the same casing heuristic as GA4 because the
/// fallback path scrapes them out of minified storefront markup.
pub static SHOPIFY_GT_PROFILE: LazyLock<DetectionProfile> = LazyLock::new(|| DetectionProfile {
    id_shape: shape(r"(?i)^GT-[A-Z0-9]{6,14}$"),
    prefix_len: 3,
    require_digit: true,
    reject_all_letter_suffix: true,
    reject_irregular_casing: true,
    false_positives: &["GT-XXXXXXXX"],
});

/// Merchant Center IDs surfaced through Shopify web-pixel configs.
pub static SHOPIFY_MC_PROFILE: LazyLock<DetectionProfile> = LazyLock::new(|| DetectionProfile {
    id_shape: shape(r"(?i)^MC-[A-Z0-9]{6,14}$"),
    prefix_len: 3,
    require_digit: true,
    reject_all_letter_suffix: true,
    reject_irregular_casing: true,
    false_positives: &["MC-XXXXXXXX"],
});

/// Known Shopify pixel-app API client IDs, mapped to human app names.
pub static SHOPIFY_APP_IDS: &[(&str, &str)] = &[
    ("1780363", "Google & YouTube"),
    ("2329312", "Facebook & Instagram"),
    ("6167201", "TikTok"),
    ("4383523", "Pinterest"),
    ("6677003", "Snapchat Ads"),
    ("580111", "Shopify Online Store"),
];
