//! We Work Remotely listing extractor.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument};
use url::Url;

use remotejobs_shared::{JobCandidate, Result};

use super::{JobSource, is_ad, resolve, text_of};
use crate::fetch::{Fetcher, RequestStyle};

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article li").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".title").expect("valid selector"));
static COMPANY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".company").expect("valid selector"));
static LOGO_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".flag-logo").expect("valid selector"));
static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));

/// `url(...)` inside an inline `background-image` style, quotes optional.
static BACKGROUND_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^"')]*)["']?\s*\)"#).expect("valid regex")
});

/// Inline-field listing: every row carries title, company, and a styled logo.
pub struct WeWorkRemotely {
    listing_url: Url,
    base_url: Url,
}

impl WeWorkRemotely {
    pub fn new(listing_url: Url, base_url: Url) -> Self {
        Self {
            listing_url,
            base_url,
        }
    }

    /// Extract one candidate per non-ad listing row.
    ///
    /// Rows missing fields are returned as-is; validity is checked downstream.
    pub fn parse_listing(&self, html: &str, captured_at: DateTime<Utc>) -> Vec<JobCandidate> {
        let doc = Html::parse_document(html);
        doc.select(&ROW_SEL)
            .filter(|row| !is_ad(row))
            .map(|row| self.parse_row(&row, captured_at))
            .collect()
    }

    fn parse_row(&self, row: &ElementRef<'_>, captured_at: DateTime<Utc>) -> JobCandidate {
        let mut job = JobCandidate::captured_at(captured_at);
        job.title = text_of(row, &TITLE_SEL);
        job.company = text_of(row, &COMPANY_SEL);

        if let Some(style) = row
            .select(&LOGO_SEL)
            .next()
            .and_then(|el| el.value().attr("style"))
        {
            if let Some(caps) = BACKGROUND_URL_RE.captures(style) {
                job.logo = resolve(&self.base_url, &caps[1]);
            }
        }

        // The first anchor is the company logo tooltip; the posting link is second.
        if let Some(href) = row
            .select(&ANCHOR_SEL)
            .nth(1)
            .and_then(|a| a.value().attr("href"))
        {
            job.url = resolve(&self.base_url, href);
        }

        job
    }
}

#[async_trait]
impl JobSource for WeWorkRemotely {
    fn name(&self) -> &str {
        "weworkremotely"
    }

    #[instrument(skip_all, fields(source = "weworkremotely", url = %self.listing_url))]
    async fn fetch(&self, fetcher: &Fetcher) -> Result<Vec<JobCandidate>> {
        let html = fetcher
            .get_html(self.name(), &self.listing_url, RequestStyle::Browser)
            .await?;
        let jobs = self.parse_listing(&html, Utc::now());
        info!(candidates = jobs.len(), "listing parsed");
        Ok(jobs)
    }
}
