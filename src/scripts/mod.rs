//! Script resolution and download.
//!
//! Builds the unified [`ScriptInfo`] list consumed by the detectors and the
//! event extractor: merges inline scripts and external references,
//! synthesizes loader entries for GTM containers found only by reference,
//! resolves URLs against the page origin, downloads the scripts worth
//! downloading (same registrable domain or known tag-manager loaders) as a
//! concurrent fan-out, and tags known third-party vendor scripts as
//! excluded from event analysis.
//!
//! Every download failure is swallowed: the script keeps empty content and
//! the audit continues. The page origin travels as an explicit parameter;
//! there is no ambient state between here and the fetch layer.

use std::collections::HashSet;
use std::sync::LazyLock;

use futures::future::join_all;
use log::debug;
use regex::Regex;
use tldextract::TldExtractor;

use crate::config::{
    EXCLUDED_EVENT_DOMAINS, MAX_SCRIPT_CONTENT_SIZE, TAG_MANAGER_HOSTS, TAG_MANAGER_LOADER_PATHS,
};
use crate::detectors::config::GTM_PROFILE;
use crate::domain::{build_extractor, same_registrable_domain};
use crate::models::{PageContent, ScriptInfo};

// The three reference shapes a GTM container ID shows up in when the page
// never emits a literal gtm.js script tag for it.
static GTM_REF_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)gtm\.js\?[^"'\s>]*\bid=(GTM-[A-Z0-9]+)"#,
        r#"(?i)[?&]id=(GTM-[A-Z0-9]+)"#,
        r#"['"](GTM-[A-Z0-9]{4,10})['"]"#,
    ]
    .iter()
    .map(|p| {
        Regex::new(p).unwrap_or_else(|e| {
            panic!("Failed to compile GTM reference pattern '{}': {}", p, e)
        })
    })
    .collect()
});

/// Builds the unified script list for one audit.
///
/// # Arguments
///
/// * `client` - Short-timeout HTTP client for script downloads
/// * `page` - The acquired page content
/// * `page_url` - The audited URL; `None` in manual-HTML mode, which
///   disables same-site downloads (loaders are still fetched)
pub async fn resolve_scripts(
    client: &reqwest::Client,
    page: &PageContent,
    page_url: Option<&str>,
) -> Vec<ScriptInfo> {
    let mut scripts: Vec<ScriptInfo> = page
        .inline_scripts
        .iter()
        .map(|content| ScriptInfo::inline(content.clone()))
        .collect();

    // Dedup externals by lower-cased src
    let mut seen_srcs = HashSet::new();
    let mut externals: Vec<ScriptInfo> = Vec::new();
    for external in &page.external_scripts {
        if seen_srcs.insert(external.src.to_lowercase()) {
            externals.push(ScriptInfo::external(external.src.clone()));
        }
    }

    // Synthesize loader entries for containers referenced without a script
    // tag; a browser would load exactly this URL for them.
    for container in find_gtm_container_refs(&page.html, &page.inline_scripts) {
        let needle = format!("gtm.js?id={}", container.to_lowercase());
        let already_loaded = externals.iter().any(|script| {
            script
                .src
                .as_deref()
                .map(|src| src.to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
        if !already_loaded {
            let loader = format!("https://www.googletagmanager.com/gtm.js?id={}", container);
            if seen_srcs.insert(loader.to_lowercase()) {
                debug!("Synthesizing loader entry for referenced container {container}");
                externals.push(ScriptInfo::external(loader));
            }
        }
    }

    // Resolve protocol-relative/relative srcs against the page origin
    let origin = page_url.and_then(|u| url::Url::parse(u).ok());
    for script in &mut externals {
        if let Some(src) = script.src.take() {
            script.src = Some(resolve_src(&src, origin.as_ref()));
        }
    }

    // Fan-out downloads, each under the client's own short timeout.
    // Failures leave the entry with empty content.
    let extractor = build_extractor();
    let mut indices = Vec::new();
    let mut tasks = Vec::new();
    for (index, script) in externals.iter().enumerate() {
        let Some(src) = script.src.clone() else {
            continue;
        };
        if !should_download(&extractor, page_url, &src) {
            continue;
        }
        let client = client.clone();
        indices.push(index);
        tasks.push(tokio::spawn(
            async move { download_script(&client, &src).await },
        ));
    }
    for (index, outcome) in indices.into_iter().zip(join_all(tasks).await) {
        if let Ok(Some(content)) = outcome {
            externals[index].content = content;
        }
    }

    // Vendor scripts are excluded from event analysis; the tag-manager
    // loader is exempt because container contents are site configuration.
    for script in &mut externals {
        if let Some(src) = script.src.as_deref() {
            script.exclude_from_events = is_excluded_domain(src) && !is_tag_manager_loader(src);
        }
    }

    scripts.extend(externals);
    scripts
}

/// Scans the page HTML and inline scripts for GTM container references,
/// validated against the container profile so placeholders are never
/// synthesized into loader URLs. Order-preserving dedup.
fn find_gtm_container_refs(html: &str, inline_scripts: &[String]) -> Vec<String> {
    let mut text = String::from(html);
    for script in inline_scripts {
        text.push('\n');
        text.push_str(script);
    }

    let mut seen = HashSet::new();
    let mut containers = Vec::new();
    for pattern in GTM_REF_PATTERNS.iter() {
        for cap in pattern.captures_iter(&text) {
            if let Some(raw) = cap.get(1) {
                if let Some(id) = GTM_PROFILE.validate(raw.as_str()) {
                    if seen.insert(id.clone()) {
                        containers.push(id);
                    }
                }
            }
        }
    }
    containers
}

/// Resolves a script src to an absolute URL where possible.
///
/// Protocol-relative srcs default to https; relative srcs resolve against
/// the page origin. With no origin (manual HTML mode) relative srcs are
/// kept as written, which also keeps them undownloadable.
fn resolve_src(src: &str, origin: Option<&url::Url>) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        return src.to_string();
    }
    if let Some(rest) = src.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    match origin {
        Some(base) => base
            .join(src)
            .map(|joined| joined.to_string())
            .unwrap_or_else(|_| src.to_string()),
        None => src.to_string(),
    }
}

/// Only two classes of external script are worth the network round trip:
/// same-site scripts (they may hold first-party tag config) and the
/// GTM/gtag loader (the container body holds most tag configuration).
fn should_download(extractor: &TldExtractor, page_url: Option<&str>, src: &str) -> bool {
    if is_tag_manager_loader(src) {
        return true;
    }
    match page_url {
        Some(page) => same_registrable_domain(extractor, page, src),
        None => false,
    }
}

fn is_tag_manager_loader(src: &str) -> bool {
    let lowered = src.to_lowercase();
    TAG_MANAGER_LOADER_PATHS
        .iter()
        .any(|path| lowered.contains(path))
        || url_host(&lowered)
            .map(|host| TAG_MANAGER_HOSTS.contains(&host.as_str()))
            .unwrap_or(false)
}

fn is_excluded_domain(src: &str) -> bool {
    let Some(host) = url_host(src) else {
        return false;
    };
    EXCLUDED_EVENT_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

fn url_host(src: &str) -> Option<String> {
    url::Url::parse(src)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

async fn download_script(client: &reqwest::Client, src: &str) -> Option<String> {
    match client.get(src).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(text) => {
                let capped: String = text.chars().take(MAX_SCRIPT_CONTENT_SIZE).collect();
                debug!("Downloaded script {} ({} bytes)", src, capped.len());
                Some(capped)
            }
            Err(e) => {
                debug!("Failed to read script body {}: {}", src, e);
                None
            }
        },
        Ok(response) => {
            debug!(
                "Failed to fetch script {}: status {}",
                src,
                response.status()
            );
            None
        }
        Err(e) => {
            debug!("Failed to fetch script {}: {}", src, e);
            None
        }
    }
}
