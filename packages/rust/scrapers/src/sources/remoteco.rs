//! Remote.co listing extractor with per-posting salary enrichment.
//!
//! The listing cards carry no salary, so every posting's detail page is
//! fetched as well. Detail fetches for one listing page run concurrently up to
//! `FetchConfig::detail_concurrency`; a failed detail fetch only costs that
//! posting its salary.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use remotejobs_shared::{JobCandidate, RemoteJobsError, Result, with_marker};

use super::{JobSource, attr_of, resolve, text_of};
use crate::fetch::{Fetcher, RequestStyle};

static CARD_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".card.m-0.border-left-0.border-right-0.border-top-0.border-bottom")
        .expect("valid selector")
});
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.font-weight-bold.larger").expect("valid selector"));
static COMPANY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.m-0.text-secondary").expect("valid selector"));
static LOGO_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img.card-img").expect("valid selector"));
static SALARY_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".job_info_container_sm .salary_sm.row .col-10.col-sm-11.pl-1")
        .expect("valid selector")
});

static SALARY_FIGURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[\d,]+").expect("valid regex"));

/// Card listing whose salaries live on the detail pages.
pub struct RemoteCo {
    listing_url: Url,
    base_url: Url,
}

impl RemoteCo {
    pub fn new(listing_url: Url, base_url: Url) -> Self {
        Self {
            listing_url,
            base_url,
        }
    }

    /// Extract one candidate per listing card. Salaries are left empty.
    pub fn parse_listing(&self, html: &str, captured_at: DateTime<Utc>) -> Vec<JobCandidate> {
        let doc = Html::parse_document(html);
        doc.select(&CARD_SEL)
            .map(|card| self.parse_card(&card, captured_at))
            .collect()
    }

    fn parse_card(&self, card: &ElementRef<'_>, captured_at: DateTime<Utc>) -> JobCandidate {
        let mut job = JobCandidate::captured_at(captured_at);
        job.title = text_of(card, &TITLE_SEL);

        // "Company | Location" share one line.
        let company_line = text_of(card, &COMPANY_SEL);
        job.company = company_line
            .split('|')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let logo = attr_of(card, &LOGO_SEL, "data-lazy-src");
        job.logo = resolve(&self.base_url, &logo);

        if let Some(href) = card.value().attr("href") {
            job.url = resolve(&self.base_url, href);
        }

        job
    }

    /// Salary from a posting's detail page, marker-prefixed, or empty.
    pub fn parse_detail_salary(html: &str) -> String {
        let doc = Html::parse_document(html);
        doc.select(&SALARY_SEL)
            .next()
            .map(|el| el.text().collect::<String>())
            .and_then(|text| {
                SALARY_FIGURE_RE
                    .find(&text)
                    .map(|m| with_marker(m.as_str()))
            })
            .unwrap_or_default()
    }

    async fn fetch_salary(&self, fetcher: &Fetcher, url: &str) -> Result<String> {
        let detail_url =
            Url::parse(url).map_err(|e| RemoteJobsError::enrichment(url, e.to_string()))?;
        let html = fetcher
            .get_html(self.name(), &detail_url, RequestStyle::Plain)
            .await
            .map_err(|e| RemoteJobsError::enrichment(url, e.to_string()))?;
        Ok(Self::parse_detail_salary(&html))
    }

    /// Fill in salaries from detail pages, preserving listing order.
    async fn enrich(&self, fetcher: &Fetcher, jobs: Vec<JobCandidate>) -> Vec<JobCandidate> {
        let limit = fetcher.config().detail_concurrency.max(1);

        stream::iter(jobs)
            .map(|mut job| async move {
                if job.url.is_empty() {
                    return job;
                }
                match self.fetch_salary(fetcher, &job.url).await {
                    Ok(salary) => {
                        debug!(url = %job.url, found = !salary.is_empty(), "salary lookup done");
                        job.salary = salary;
                    }
                    Err(e) => {
                        warn!(url = %job.url, error = %e, "salary lookup failed, continuing without salary");
                    }
                }
                job
            })
            .buffered(limit)
            .collect()
            .await
    }
}

#[async_trait]
impl JobSource for RemoteCo {
    fn name(&self) -> &str {
        "remoteco"
    }

    #[instrument(skip_all, fields(source = "remoteco", url = %self.listing_url))]
    async fn fetch(&self, fetcher: &Fetcher) -> Result<Vec<JobCandidate>> {
        let html = fetcher
            .get_html(self.name(), &self.listing_url, RequestStyle::Plain)
            .await?;
        let jobs = self.parse_listing(&html, Utc::now());
        info!(candidates = jobs.len(), "listing parsed, fetching detail pages");

        let jobs = self.enrich(fetcher, jobs).await;
        let with_salary = jobs.iter().filter(|j| !j.salary.is_empty()).count();
        info!(candidates = jobs.len(), with_salary, "detail pages processed");
        Ok(jobs)
    }
}
