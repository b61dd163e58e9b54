//! Tracking-health scoring and recommendations.
//!
//! Deterministic linear scoring from 100 with fixed per-condition penalties,
//! clamped to `[0, 100]`. Recommendations are built in the same pass, in
//! detector-then-event order, one human-readable string per triggered
//! condition.

use std::collections::HashSet;

use crate::detectors;
use crate::models::{
    AuditSummary, DetectorResult, EventIssue, EventPlatform, EventRecord, GtmResult,
};

/// Everything the scorer reads. All references into the orchestrator's
/// already-assembled results; scoring itself allocates only its output.
pub struct ScoreInput<'a> {
    /// GA4 detection result.
    pub ga4: &'a DetectorResult,
    /// GTM detection result.
    pub gtm: &'a GtmResult,
    /// Meta Pixel detection result.
    pub meta_pixel: &'a DetectorResult,
    /// Duplicate event occurrences from the analyzer.
    pub duplicates: &'a [EventRecord],
    /// Required-parameter violations from the analyzer.
    pub issues: &'a [EventIssue],
}

/// Computes the tracking health score and recommendation list.
pub fn summarize(input: &ScoreInput<'_>) -> AuditSummary {
    let mut score: i32 = 100;
    let mut recommendations = Vec::new();

    if !input.ga4.detected {
        score -= 20;
        recommendations.push(
            "Google Analytics 4 is not installed. Add the GA4 tag (gtag.js) to start \
             collecting analytics data."
                .to_string(),
        );
    } else {
        if has_error(&input.ga4.errors, detectors::MULTIPLE_GA4_IDS) {
            score -= 10;
            recommendations.push(
                "Multiple GA4 measurement IDs were found on the page. Consolidate to a \
                 single ID to avoid double counting."
                    .to_string(),
            );
        }
        if has_error(
            &input.ga4.errors,
            detectors::GA4_SCRIPT_WITHOUT_CONFIG,
        ) {
            score -= 15;
            recommendations.push(
                "The GA4 script is loaded but never configured. Add a gtag('config', ...) \
                 call with your measurement ID."
                    .to_string(),
            );
        }
    }

    if !input.gtm.detected {
        score -= 5;
        recommendations.push(
            "Google Tag Manager is not installed. Consider GTM to manage marketing tags \
             without code changes."
                .to_string(),
        );
    } else {
        if has_error(
            &input.gtm.errors,
            detectors::GTM_LOADED_MULTIPLE_TIMES,
        ) {
            score -= 15;
            recommendations.push(
                "The same GTM container is loaded more than once. Remove the duplicate \
                 snippet to prevent tags firing twice."
                    .to_string(),
            );
        }
        if has_error(
            &input.gtm.errors,
            detectors::DATALAYER_NOT_INITIALIZED,
        ) {
            score -= 10;
            recommendations.push(
                "The dataLayer is not initialized before GTM loads. Add \
                 'window.dataLayer = window.dataLayer || []' above the container snippet."
                    .to_string(),
            );
        }
    }

    if !input.meta_pixel.detected {
        score -= 10;
        recommendations.push(
            "Meta Pixel is not installed. Add the pixel base code to enable Facebook and \
             Instagram ad measurement."
                .to_string(),
        );
    } else if has_error(
        &input.meta_pixel.errors,
        detectors::MULTIPLE_PIXEL_IDS,
    ) {
        score -= 10;
        recommendations.push(
            "Multiple Meta Pixel IDs were found. Verify that only the intended pixel \
             fires on this page."
                .to_string(),
        );
    }

    let mut duplicate_keys: HashSet<(EventPlatform, String)> = HashSet::new();
    for duplicate in input.duplicates {
        if duplicate_keys.insert(duplicate.key()) {
            score -= 5;
            recommendations.push(format!(
                "The {} event '{}' fires multiple times on this page. Deduplicate it to \
                 keep reporting accurate.",
                duplicate.platform, duplicate.name
            ));
        }
    }

    for issue in input.issues {
        score -= 8;
        recommendations.push(format!(
            "The {} event '{}' is missing required parameters: {}.",
            issue.event.platform,
            issue.event.name,
            issue.missing_params.join(", ")
        ));
    }

    let issues_found = recommendations.len();
    let score = score.clamp(0, 100);

    if issues_found == 0 && score == 100 {
        recommendations.push(
            "Tracking looks healthy. All detected tags are installed and configured \
             correctly."
                .to_string(),
        );
    }

    AuditSummary {
        tracking_health_score: score,
        issues_found,
        recommendations,
    }
}

fn has_error(errors: &[String], code: &str) -> bool {
    errors.iter().any(|e| e == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(ids: &[&str], errors: &[&str]) -> DetectorResult {
        DetectorResult {
            detected: true,
            ids: ids.iter().map(|s| s.to_string()).collect(),
            errors: errors.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn gtm_detected(errors: &[&str]) -> GtmResult {
        GtmResult {
            detected: true,
            containers: vec!["GTM-AB12CD".into()],
            errors: errors.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_nothing_detected_scores_65() {
        let summary = summarize(&ScoreInput {
            ga4: &DetectorResult::default(),
            gtm: &GtmResult::default(),
            meta_pixel: &DetectorResult::default(),
            duplicates: &[],
            issues: &[],
        });
        assert_eq!(summary.tracking_health_score, 65);
        assert_eq!(summary.issues_found, 3);
        assert_eq!(summary.recommendations.len(), 3);
        assert!(summary
            .recommendations
            .iter()
            .all(|r| r.contains("not installed")));
    }

    #[test]
    fn test_healthy_page_scores_100_with_positive_message() {
        let summary = summarize(&ScoreInput {
            ga4: &detected(&["G-ABC1234567"], &[]),
            gtm: &gtm_detected(&[]),
            meta_pixel: &detected(&["1234567890123456"], &[]),
            duplicates: &[],
            issues: &[],
        });
        assert_eq!(summary.tracking_health_score, 100);
        assert_eq!(summary.issues_found, 0);
        assert_eq!(summary.recommendations.len(), 1);
        assert!(summary.recommendations[0].contains("healthy"));
    }

    #[test]
    fn test_error_penalties_apply_only_when_detected() {
        let summary = summarize(&ScoreInput {
            ga4: &detected(
                &["G-ABC1234567", "G-DEF7654321"],
                &["multiple_ga4_ids", "ga4_script_without_config"],
            ),
            gtm: &gtm_detected(&["gtm_loaded_multiple_times", "datalayer_not_initialized"]),
            meta_pixel: &detected(
                &["1234567890123456", "6543210987654321"],
                &["multiple_pixel_ids"],
            ),
            duplicates: &[],
            issues: &[],
        });
        // 100 - 10 - 15 - 15 - 10 - 10
        assert_eq!(summary.tracking_health_score, 40);
        assert_eq!(summary.issues_found, 5);
    }

    #[test]
    fn test_duplicate_keys_penalized_once_each() {
        let duplicates = vec![
            EventRecord::new(EventPlatform::Ga4, "purchase"),
            EventRecord::new(EventPlatform::Ga4, "purchase"),
            EventRecord::new(EventPlatform::MetaPixel, "Purchase"),
        ];
        let summary = summarize(&ScoreInput {
            ga4: &detected(&["G-ABC1234567"], &[]),
            gtm: &gtm_detected(&[]),
            meta_pixel: &detected(&["1234567890123456"], &[]),
            duplicates: &duplicates,
            issues: &[],
        });
        // Two distinct duplicate keys: -5 each
        assert_eq!(summary.tracking_health_score, 90);
        assert_eq!(summary.issues_found, 2);
    }

    #[test]
    fn test_score_clamped_to_zero() {
        let issues: Vec<EventIssue> = (0..20)
            .map(|i| EventIssue {
                event: EventRecord::new(EventPlatform::Ga4, format!("purchase_{}", i)),
                missing_params: vec!["value".into()],
            })
            .collect();
        let summary = summarize(&ScoreInput {
            ga4: &DetectorResult::default(),
            gtm: &GtmResult::default(),
            meta_pixel: &DetectorResult::default(),
            duplicates: &[],
            issues: &issues,
        });
        assert_eq!(summary.tracking_health_score, 0);
    }

    #[test]
    fn test_missing_params_penalty() {
        let issues = vec![EventIssue {
            event: EventRecord::new(EventPlatform::MetaPixel, "Purchase"),
            missing_params: vec!["currency".into()],
        }];
        let summary = summarize(&ScoreInput {
            ga4: &detected(&["G-ABC1234567"], &[]),
            gtm: &gtm_detected(&[]),
            meta_pixel: &detected(&["1234567890123456"], &[]),
            duplicates: &[],
            issues: &issues,
        });
        assert_eq!(summary.tracking_health_score, 92);
        assert!(summary.recommendations[0].contains("currency"));
    }
}
