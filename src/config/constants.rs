//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the crate,
//! including timeouts, size limits, request headers, and the closed domain
//! lists that drive external-script selection.

use std::time::Duration;

// Network operation timeouts
/// Page fetch timeout.
/// Marketing audits run against arbitrary storefronts, some of which sit
/// behind slow consent walls and CDNs, so this is generous.
pub const PAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(20);
/// Per-script download timeout.
/// External scripts are fetched as a fan-out; each request gets its own short
/// deadline so one slow tag server cannot stall the whole audit.
pub const SCRIPT_FETCH_TIMEOUT: Duration = Duration::from_secs(6);

/// Browser-like User-Agent string for HTTP requests.
/// Tag managers and anti-bot layers serve different markup to obvious bots,
/// which would hide the very snippets this crate audits.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
/// Accept header sent with page requests.
pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
/// Accept-Language header sent with page requests.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

// Response and body size limits
/// Maximum page body size in bytes (2MB).
/// Bodies are truncated at this size to prevent memory exhaustion.
pub const MAX_PAGE_BODY_SIZE: usize = 2 * 1024 * 1024;
/// Maximum script content size in bytes (512KB per script).
/// GTM container bodies routinely exceed 100KB, so this is higher than a
/// typical inline-script cap but still bounded.
pub const MAX_SCRIPT_CONTENT_SIZE: usize = 512 * 1024;

// Event extraction limits
/// Maximum number of event records kept per (platform, event name) key.
/// Bounds pathological pages that fire the same event hundreds of times while
/// still letting the first occurrences feed duplicate detection.
pub const MAX_EVENTS_PER_KEY: usize = 5;

/// Known tag-manager loader hosts. Scripts served from these hosts are
/// downloaded even though they are third-party, because the GTM/gtag
/// container body is where most tag configuration lives.
pub const TAG_MANAGER_HOSTS: &[&str] = &["www.googletagmanager.com", "googletagmanager.com"];

/// URL substrings identifying the GTM/gtag loader itself.
pub const TAG_MANAGER_LOADER_PATHS: &[&str] = &[
    "googletagmanager.com/gtm.js",
    "googletagmanager.com/gtag/js",
];

/// Third-party ad/analytics script hosts whose content is excluded from event
/// analysis. The vendor's own library (e.g. `fbevents.js`) contains event
/// plumbing that would be double-counted as site-authored event calls.
/// The GTM/gtag loader is exempt: container contents are site configuration.
pub const EXCLUDED_EVENT_DOMAINS: &[&str] = &[
    "connect.facebook.net",
    "www.google-analytics.com",
    "google-analytics.com",
    "www.googleadservices.com",
    "googleadservices.com",
    "www.googletagservices.com",
    "stats.g.doubleclick.net",
    "static.hotjar.com",
    "www.clarity.ms",
    "analytics.tiktok.com",
    "snap.licdn.com",
    "static.ads-twitter.com",
    "s.pinimg.com",
];
