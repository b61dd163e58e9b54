//! tag_audit library: marketing tag detection and tracking-health scoring.
//!
//! This library audits one web page for marketing/analytics tag
//! installations (Google Analytics 4, Google Tag Manager, Meta Pixel,
//! Google Ads, Shopify Web Pixels) and the events they fire, then scores
//! tracking health and produces human-readable recommendations.
//!
//! # Example
//!
//! ```no_run
//! use tag_audit::{run_audit, AuditInput};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = run_audit(AuditInput::from_url("https://www.example.com")).await?;
//! println!(
//!     "score {} with {} issue(s); GA4 detected: {}",
//!     result.summary.tracking_health_score,
//!     result.summary.issues_found,
//!     result.ga4.detected
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime for URL-mode audits and external
//! script downloads. Use `#[tokio::main]` in your application or call from
//! within an async context.

#![warn(missing_docs)]

mod audit;
pub mod config;
pub mod detectors;
mod domain;
mod error_handling;
pub mod events;
pub mod initialization;
pub mod js_parsing;
mod models;
mod page;
pub mod scoring;
mod scripts;

// Re-export public API
pub use audit::{run_audit, AuditInput, MANUAL_HTML_URL};
pub use error_handling::{AuditError, URL_OR_HTML_REQUIRED};
pub use models::{
    AuditResult, AuditSummary, DetectorResult, EventIssue, EventPlatform, EventRecord,
    ExternalScript, GoogleAdsResult, GtmResult, PageContent, ScriptInfo, ScriptKind, ShopifyInfo,
};
