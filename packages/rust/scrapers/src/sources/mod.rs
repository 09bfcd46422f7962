//! Job source trait and built-in job board extractors.
//!
//! Each source knows one board's listing markup and turns it into
//! [`JobCandidate`]s. Sources are independent: none shares state with another,
//! and the refresh pipeline only ever sees them through [`JobSource`].

mod remoteco;
mod remoteok;
mod weworkremotely;

use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use url::Url;

use remotejobs_shared::{JobCandidate, RemoteJobsError, Result, SourceEntry, SourcesConfig};

use crate::fetch::Fetcher;

pub use remoteco::RemoteCo;
pub use remoteok::RemoteOk;
pub use weworkremotely::WeWorkRemotely;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A job board that can be scraped into candidates.
///
/// A failed listing fetch is returned as an error; per-posting problems are
/// handled inside the source and never fail the whole fetch.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Stable source name used in logs and reports.
    fn name(&self) -> &str;

    /// Fetch the source's listing page(s) and extract candidates.
    async fn fetch(&self, fetcher: &Fetcher) -> Result<Vec<JobCandidate>>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The sources a refresh runs, in registration order.
pub struct SourceRegistry {
    sources: Vec<Box<dyn JobSource>>,
}

impl SourceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Build the built-in sources that are enabled in `config`.
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let mut registry = Self::new();

        if config.weworkremotely.enabled {
            let (listing, base) = source_urls("weworkremotely", &config.weworkremotely)?;
            registry.register(Box::new(WeWorkRemotely::new(listing, base)));
        }
        if config.remoteok.enabled {
            let (listing, base) = source_urls("remoteok", &config.remoteok)?;
            registry.register(Box::new(RemoteOk::new(listing, base)));
        }
        if config.remoteco.enabled {
            let (listing, base) = source_urls("remoteco", &config.remoteco)?;
            registry.register(Box::new(RemoteCo::new(listing, base)));
        }

        Ok(registry)
    }

    /// Add a source to the end of the run order.
    pub fn register(&mut self, source: Box<dyn JobSource>) {
        self.sources.push(source);
    }

    /// Registered sources in run order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn JobSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// Names of the registered sources.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn source_urls(name: &str, entry: &SourceEntry) -> Result<(Url, Url)> {
    let parse = |field: &str, value: &str| {
        Url::parse(value).map_err(|e| {
            RemoteJobsError::config(format!("sources.{name}.{field} '{value}' is not a URL: {e}"))
        })
    };
    Ok((
        parse("listing_url", &entry.listing_url)?,
        parse("base_url", &entry.base_url)?,
    ))
}

// ---------------------------------------------------------------------------
// Markup helpers
// ---------------------------------------------------------------------------

/// Trimmed text of the first descendant matching `sel`, or empty.
pub(crate) fn text_of(el: &ElementRef<'_>, sel: &Selector) -> String {
    el.select(sel)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Attribute `attr` of the first descendant matching `sel`, or empty.
pub(crate) fn attr_of(el: &ElementRef<'_>, sel: &Selector, attr: &str) -> String {
    el.select(sel)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Whether the element is a sponsored row.
pub(crate) fn is_ad(el: &ElementRef<'_>) -> bool {
    el.value().classes().any(|c| c == "ad")
}

/// Resolve `href` against `base`; empty when `href` is empty or unusable.
pub(crate) fn resolve(base: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    base.join(href).map(|u| u.to_string()).unwrap_or_default()
}
