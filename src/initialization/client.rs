//! HTTP client initialization.
//!
//! This module provides functions to initialize the HTTP clients used for
//! the page fetch and for external-script downloads.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::ClientBuilder;

use crate::config::{
    DEFAULT_ACCEPT, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT, PAGE_FETCH_TIMEOUT,
    SCRIPT_FETCH_TIMEOUT,
};
use crate::error_handling::AuditError;

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
    );
    headers
}

/// Initializes the HTTP client used for the single page fetch.
///
/// Creates a `reqwest::Client` configured with:
/// - Browser-like User-Agent, Accept, and Accept-Language headers
/// - The page fetch timeout from `config`
/// - Redirect following (reqwest's default policy, capped at 10 hops)
///
/// # Errors
///
/// Returns `AuditError::HttpClientError` if client creation fails.
pub fn init_page_client() -> Result<reqwest::Client, AuditError> {
    let client = ClientBuilder::new()
        .timeout(PAGE_FETCH_TIMEOUT)
        .user_agent(DEFAULT_USER_AGENT)
        .default_headers(browser_headers())
        .build()?;
    Ok(client)
}

/// Initializes the HTTP client used for external-script downloads.
///
/// Uses the same browser-like headers as the page client but a much shorter
/// timeout, since each script download is one leg of a fan-out and must not
/// stall the audit.
///
/// # Errors
///
/// Returns `AuditError::HttpClientError` if client creation fails.
pub fn init_script_client() -> Result<reqwest::Client, AuditError> {
    let client = ClientBuilder::new()
        .timeout(SCRIPT_FETCH_TIMEOUT)
        .user_agent(DEFAULT_USER_AGENT)
        .default_headers(browser_headers())
        .build()?;
    Ok(client)
}
