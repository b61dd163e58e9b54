//! Event-list analysis: duplicate detection and parameter validation.

use std::collections::HashMap;

use super::required_params::required_params_for;
use crate::models::{EventIssue, EventPlatform, EventRecord};

/// Reports every occurrence of a `(platform, name)` key after the first.
///
/// The main list is left untouched; duplicates stay visible there for audit
/// purposes. Order is preserved.
pub fn find_duplicate_events(events: &[EventRecord]) -> Vec<EventRecord> {
    let mut seen: HashMap<(EventPlatform, String), usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for event in events {
        let count = seen.entry(event.key()).or_insert(0);
        *count += 1;
        if *count > 1 {
            duplicates.push(event.clone());
        }
    }
    duplicates
}

/// Validates events against the static required-parameter tables.
///
/// Only events whose name appears in the platform's table are checked; each
/// violation lists the required keys absent from `event.params`.
pub fn validate_event_parameters(events: &[EventRecord]) -> Vec<EventIssue> {
    let mut issues = Vec::new();
    for event in events {
        let Some(required) = required_params_for(event.platform, &event.name) else {
            continue;
        };
        let missing: Vec<String> = required
            .iter()
            .filter(|param| !event.params.contains_key(**param))
            .map(|param| param.to_string())
            .collect();
        if !missing.is_empty() {
            issues.push(EventIssue {
                event: event.clone(),
                missing_params: missing,
            });
        }
    }
    issues
}
