//! Registrable-domain utilities.
//!
//! The script resolver only downloads external scripts served from the same
//! registrable domain as the audited page (plus known tag-manager loaders).
//! `tldextract` handles multi-part suffixes (e.g. "example.co.uk") that a
//! naive host comparison would get wrong.

use anyhow::{Context, Result};
use tldextract::{TldExtractor, TldOption};

/// Builds a TLD extractor with default options.
///
/// The extractor is cheap to construct and carries no network state; one is
/// created per audit run.
pub fn build_extractor() -> TldExtractor {
    TldExtractor::new(TldOption::default())
}

/// Extracts the registrable domain from a URL.
///
/// # Arguments
///
/// * `extractor` - The TldExtractor instance
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// The registrable domain (e.g., "example.com" from
/// "https://www.example.com/path").
///
/// # Errors
///
/// Returns an error if the URL cannot be parsed, has no host, or no
/// registrable domain can be derived (e.g. IP-address hosts).
pub fn extract_domain(extractor: &TldExtractor, url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).with_context(|| format!("Failed to parse URL: {}", url))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("URL '{}' has no host component", url))?;

    // IP addresses do not have registrable domains
    if matches!(
        parsed.host(),
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_))
    ) {
        return Err(anyhow::anyhow!(
            "IP addresses do not have registrable domains: {}",
            host
        ));
    }

    let result = extractor
        .extract(url)
        .with_context(|| format!("Failed to extract domain from URL: {}", url))?;

    match (result.domain, result.suffix) {
        (Some(domain), Some(suffix)) => Ok(format!("{}.{}", domain, suffix)),
        (Some(domain), None) => Ok(domain),
        (None, Some(suffix)) => Ok(suffix),
        (None, None) => Err(anyhow::anyhow!("No domain or suffix found in URL: {}", url)),
    }
}

/// Checks whether two URLs share a registrable base domain.
///
/// Comparison is case-insensitive; any extraction failure counts as
/// "different site" so that unparseable script URLs are never downloaded.
pub fn same_registrable_domain(extractor: &TldExtractor, a: &str, b: &str) -> bool {
    match (extract_domain(extractor, a), extract_domain(extractor, b)) {
        (Ok(da), Ok(db)) => da.eq_ignore_ascii_case(&db),
        _ => false,
    }
}
