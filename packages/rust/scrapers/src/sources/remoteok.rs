//! Remote OK listing extractor.
//!
//! Salary is not a field of its own on this board: it shares the `.location`
//! badge style with the region tags, and is told apart by the salary marker.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument};
use url::Url;

use remotejobs_shared::{JobCandidate, Result, SALARY_MARKER};

use super::{JobSource, attr_of, is_ad, resolve, text_of};
use crate::fetch::{Fetcher, RequestStyle};

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("valid selector"));
static COMPANY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("valid selector"));
static LOGO_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".has-logo img").expect("valid selector"));
static BADGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".location").expect("valid selector"));

/// Table listing with the salary mixed into the location badges.
pub struct RemoteOk {
    listing_url: Url,
    base_url: Url,
}

impl RemoteOk {
    pub fn new(listing_url: Url, base_url: Url) -> Self {
        Self {
            listing_url,
            base_url,
        }
    }

    /// Extract one candidate per non-ad table row.
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

        let logo = attr_of(row, &LOGO_SEL, "data-src");
        job.logo = resolve(&self.base_url, &logo);

        if let Some(href) = row.value().attr("data-url") {
            job.url = resolve(&self.base_url, href);
        }

        // Last salary-marked badge wins.
        if let Some(salary) = row
            .select(&BADGE_SEL)
            .map(|badge| badge.text().collect::<String>().trim().to_string())
            .filter(|text| text.starts_with(SALARY_MARKER))
            .last()
        {
            job.salary = salary;
        }

        job
    }
}

#[async_trait]
impl JobSource for RemoteOk {
    fn name(&self) -> &str {
        "remoteok"
    }

    #[instrument(skip_all, fields(source = "remoteok", url = %self.listing_url))]
    async fn fetch(&self, fetcher: &Fetcher) -> Result<Vec<JobCandidate>> {
        let html = fetcher
            .get_html(self.name(), &self.listing_url, RequestStyle::Browser)
            .await?;
        let jobs = self.parse_listing(&html, Utc::now());
        info!(candidates = jobs.len(), "listing parsed");
        Ok(jobs)
    }
}
