//! Ad-provider domain analysis
//!
//! Best-effort enrichment: fetch a site's homepage, look for known ad and
//! analytics providers in script sources and inline markup, and emit the
//! exclusions those providers need. Failures here never fail the request; the
//! caller reports them as a warning and returns the base config.

use crate::error::{Error, Result};
use crate::rules::RuleEntry;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

/// User agent for requests (standard Chrome on Windows)
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Hard timeout for the single outbound fetch
const ANALYSIS_TIMEOUT_SECS: u64 = 10;

/// Allowed URL schemes
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Any *.adthrive.com subdomain in a script source
static ADTHRIVE_HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://([a-z0-9-]+\.)*adthrive\.com/").unwrap()
});

/// Signature of a third-party ad/analytics provider
#[derive(Debug)]
pub struct AdProvider {
    /// Display name reported in the response
    pub name: &'static str,
    /// Substrings matched against script `src` URLs
    domains: &'static [&'static str],
    /// Substrings matched against the lowercased page HTML
    patterns: &'static [&'static str],
    js_exclusions: &'static [&'static str],
    delay_js_exclusions: &'static [&'static str],
    rucss_excluded_stylesheets: &'static [&'static str],
}

impl AdProvider {
    /// Exclusions to add when this provider is detected
    fn exclusions(&self) -> RuleEntry {
        RuleEntry {
            js_exclusions: self.js_exclusions.iter().map(|s| s.to_string()).collect(),
            delay_js_exclusions: self
                .delay_js_exclusions
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rucss_excluded_stylesheets: self
                .rucss_excluded_stylesheets
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Known provider signatures
const AD_PROVIDERS: &[AdProvider] = &[
    AdProvider {
        name: "Mediavine",
        domains: &["scripts.mediavine.com", "ads.mediavine.com"],
        patterns: &["window.mediavinedomain", "__mediavinemachine", "mediavine"],
        js_exclusions: &["mediavine", "mediavine.min.js"],
        delay_js_exclusions: &["mediavine", "mediavine.min.js"],
        rucss_excluded_stylesheets: &["mediavine.min.css"],
    },
    AdProvider {
        name: "AdThrive/Raptive",
        domains: &["adthrive.com", "raptive.com", "raptive.s3", "raptivecdn.com"],
        patterns: &["window.adthrive", "adthrive.config", "at.siteid", "raptive"],
        js_exclusions: &["adthrive", "adthrive.min.js", "ads.min.js"],
        delay_js_exclusions: &["adthrive", "adthrive.min.js", "ads.min.js", "googletag"],
        rucss_excluded_stylesheets: &["ads.min.css", "adthrive.min.css"],
    },
    AdProvider {
        name: "Ezoic",
        domains: &["www.ezojs.com", "ezoic.com", "ezoic.net"],
        patterns: &["ezstandalone", "ez_ad_units", "ezoic"],
        js_exclusions: &["ezoic", "ezoic.min.js"],
        delay_js_exclusions: &["ezoic", "ezoic.min.js"],
        rucss_excluded_stylesheets: &["ezoic.min.css"],
    },
    AdProvider {
        name: "Google AdSense",
        domains: &["pagead2.googlesyndication.com", "googleadservices.com"],
        patterns: &["adsbygoogle.push", "(adsbygoogle", "google_ad_client"],
        js_exclusions: &["adsbygoogle"],
        delay_js_exclusions: &["adsbygoogle"],
        rucss_excluded_stylesheets: &[],
    },
    AdProvider {
        name: "Google Ad Manager",
        domains: &["securepubads.g.doubleclick.net", "googletagservices.com"],
        patterns: &["googletag.defineslot", "googletag.pubads", "gpt.js"],
        js_exclusions: &["googletag"],
        delay_js_exclusions: &["googletag"],
        rucss_excluded_stylesheets: &[],
    },
    AdProvider {
        name: "Amazon Associates",
        domains: &["ws-na.amazon-adsystem.com", "amazon-adsystem.com"],
        patterns: &["amzn_assoc_", "amazon-adsystem"],
        js_exclusions: &["amazon-adsystem"],
        delay_js_exclusions: &["amazon-adsystem"],
        rucss_excluded_stylesheets: &[],
    },
    AdProvider {
        name: "Monumetric",
        domains: &["d2v734f2ybhd6d.cloudfront.net", "monumetric.com"],
        patterns: &["monumetricads", "monumetric"],
        js_exclusions: &["monumetric"],
        delay_js_exclusions: &["monumetric"],
        rucss_excluded_stylesheets: &[],
    },
    AdProvider {
        name: "Media.net",
        domains: &["contextual.media.net", "media.net"],
        patterns: &["media_net", "media.net"],
        js_exclusions: &["media_net"],
        delay_js_exclusions: &["media_net"],
        rucss_excluded_stylesheets: &[],
    },
];

/// Result of analyzing a domain
#[derive(Debug, Default)]
pub struct DomainAnalysis {
    /// Names of detected providers, in signature-list order
    pub providers: Vec<String>,
    /// Combined exclusions for all detected providers
    pub exclusions: RuleEntry,
}

/// Fetches a site's homepage and classifies third-party ad scripts
#[derive(Debug)]
pub struct DomainAnalyzer {
    client: Client,
}

impl DomainAnalyzer {
    /// Create an analyzer with the bounded-timeout HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(ANALYSIS_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    /// Fetch the domain's homepage and detect ad providers
    ///
    /// Accepts a bare domain or a full URL; `https://` is assumed when no
    /// scheme is given.
    pub async fn analyze(&self, domain: &str) -> Result<DomainAnalysis> {
        let url = normalize_url(domain)?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::HttpRequest(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::HttpRequest(e.to_string()))?;

        let analysis = detect_providers(&html);
        tracing::info!(
            domain = %url,
            providers = ?analysis.providers,
            "domain analysis complete"
        );
        Ok(analysis)
    }
}

/// Normalize a domain or URL into a fetchable https URL
fn normalize_url(domain: &str) -> Result<String> {
    let with_scheme = if !domain.contains("://") {
        format!("https://{}", domain)
    } else {
        domain.to_string()
    };

    let parsed =
        url::Url::parse(&with_scheme).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(Error::InvalidUrl(format!(
            "scheme '{}' not allowed (use http or https)",
            parsed.scheme()
        )));
    }
    Ok(parsed.to_string())
}

/// Classify a page's HTML against the known provider signatures
pub fn detect_providers(html: &str) -> DomainAnalysis {
    let script_sources = extract_script_sources(html);
    let html_lower = html.to_lowercase();

    let mut analysis = DomainAnalysis::default();
    for provider in AD_PROVIDERS {
        if provider_detected(provider, &html_lower, &script_sources) {
            analysis.providers.push(provider.name.to_string());
            let exclusions = provider.exclusions();
            analysis
                .exclusions
                .js_exclusions
                .extend(exclusions.js_exclusions);
            analysis
                .exclusions
                .delay_js_exclusions
                .extend(exclusions.delay_js_exclusions);
            analysis
                .exclusions
                .rucss_excluded_stylesheets
                .extend(exclusions.rucss_excluded_stylesheets);
        }
    }
    analysis
}

/// Collect `src` attributes from script tags
fn extract_script_sources(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("script[src]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .map(|src| src.to_string())
        .collect()
}

/// Check one provider's signatures against script sources and page HTML
fn provider_detected(provider: &AdProvider, html_lower: &str, script_sources: &[String]) -> bool {
    for src in script_sources {
        let src_lower = src.to_lowercase();

        if provider.domains.iter().any(|d| src_lower.contains(d)) {
            return true;
        }

        // AdThrive serves from per-site subdomains and generic paths
        if provider.name == "AdThrive/Raptive"
            && (ADTHRIVE_HOST_RE.is_match(src)
                || src_lower.contains("ads.min.js")
                || src_lower.contains("/sites/"))
        {
            return true;
        }
    }

    provider.patterns.iter().any(|p| html_lower.contains(p))
}
