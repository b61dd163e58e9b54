//! Event extraction and analysis.
//!
//! The extractor scans site-authored script content for event-firing call
//! sites; the analyzer flags duplicates and validates required parameters.

mod analysis;
mod extract;
pub mod required_params;

use std::collections::HashMap;

use crate::config::MAX_EVENTS_PER_KEY;
use crate::models::{EventPlatform, EventRecord};

pub use analysis::{find_duplicate_events, validate_event_parameters};
pub use extract::extract_events;

/// Write-through collector that caps stored records per `(platform, name)`
/// key. The first occurrences are all kept so duplicate detection still
/// sees them; everything past the cap is dropped.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<EventRecord>,
    counts: HashMap<(EventPlatform, String), usize>,
}

impl EventCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record unless its key already hit the cap.
    ///
    /// # Returns
    ///
    /// `true` if the record was kept.
    pub fn push(&mut self, record: EventRecord) -> bool {
        let count = self.counts.entry(record.key()).or_insert(0);
        if *count >= MAX_EVENTS_PER_KEY {
            return false;
        }
        *count += 1;
        self.events.push(record);
        true
    }

    /// True if at least one record with this key was stored.
    pub fn contains_key(&self, platform: EventPlatform, name: &str) -> bool {
        self.counts
            .contains_key(&(platform, name.to_string()))
    }

    /// Consumes the collector, yielding records in insertion order.
    pub fn into_events(self) -> Vec<EventRecord> {
        self.events
    }
}
