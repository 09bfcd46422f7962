//! Read path: recent salaried jobs, sorted and filtered for display.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use remotejobs_shared::{Job, RemoteJobsError, Result, normalize};
use remotejobs_storage::Storage;

/// Salary ordering applied before the keyword filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SalaryOrder {
    /// Keep the store's order.
    #[default]
    All,
    Highest,
    Lowest,
}

impl FromStr for SalaryOrder {
    type Err = RemoteJobsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "highest" => Ok(Self::Highest),
            "lowest" => Ok(Self::Lowest),
            other => Err(RemoteJobsError::validation(format!(
                "unknown salary order '{other}', expected all, highest or lowest"
            ))),
        }
    }
}

impl fmt::Display for SalaryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Highest => f.write_str("highest"),
            Self::Lowest => f.write_str("lowest"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub order: SalaryOrder,
    /// Case-insensitive title substring; empty matches everything.
    pub keyword: String,
}

/// Sort `jobs` by salary, then keep the titles matching the keyword.
pub fn view(jobs: &[Job], options: &ViewOptions) -> Vec<Job> {
    let sorted = sort_by_salary(jobs, options.order);
    filter_by_keyword(&sorted, &options.keyword)
}

fn sort_by_salary(jobs: &[Job], order: SalaryOrder) -> Vec<Job> {
    if order == SalaryOrder::All {
        return jobs.to_vec();
    }

    let mut keyed: Vec<(f64, &Job)> = jobs
        .iter()
        .filter(|job| job.salary_text().is_some())
        .map(|job| (normalize(job.salary_text()), job))
        .collect();

    // sort_by is stable, so equal salaries keep their input order.
    match order {
        SalaryOrder::Highest => keyed.sort_by(|a, b| b.0.total_cmp(&a.0)),
        SalaryOrder::Lowest => keyed.sort_by(|a, b| a.0.total_cmp(&b.0)),
        SalaryOrder::All => {}
    }

    keyed.into_iter().map(|(_, job)| job.clone()).collect()
}

fn filter_by_keyword(jobs: &[Job], keyword: &str) -> Vec<Job> {
    let needle = keyword.to_lowercase();
    if needle.is_empty() {
        return jobs.to_vec();
    }
    jobs.iter()
        .filter(|job| job.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Jobs with a salary captured within `window` of `now`, newest first.
///
/// The boundary is inclusive: a job captured exactly `window` ago is kept.
pub async fn recent_jobs(store: &Storage, window: Duration, now: DateTime<Utc>) -> Result<Vec<Job>> {
    let since = now - window;
    let jobs = store.list_recent_with_salary(since).await?;
    debug!(%since, count = jobs.len(), "loaded recent jobs");
    Ok(jobs)
}

/// Interactive view state over a fixed base list.
///
/// Every change re-derives the visible list from the base, so successive
/// keyword edits never narrow each other.
#[derive(Debug, Clone)]
pub struct JobBoard {
    base: Vec<Job>,
    sorted: Vec<Job>,
    options: ViewOptions,
    visible: Vec<Job>,
}

impl JobBoard {
    pub fn new(base: Vec<Job>) -> Self {
        let mut board = Self {
            sorted: base.clone(),
            visible: base.clone(),
            base,
            options: ViewOptions::default(),
        };
        board.resort();
        board
    }

    pub fn set_order(&mut self, order: SalaryOrder) {
        self.options.order = order;
        self.resort();
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.options.keyword = keyword.into();
        self.visible = filter_by_keyword(&self.sorted, &self.options.keyword);
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// The jobs currently shown.
    pub fn visible(&self) -> &[Job] {
        &self.visible
    }

    pub fn base(&self) -> &[Job] {
        &self.base
    }

    fn resort(&mut self) {
        self.sorted = sort_by_salary(&self.base, self.options.order);
        self.visible = filter_by_keyword(&self.sorted, &self.options.keyword);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remotejobs_shared::{JobCandidate, JobId};
    use uuid::Uuid;

    fn job(title: &str, salary: Option<&str>) -> Job {
        JobCandidate {
            title: title.into(),
            company: "Acme".into(),
            url: format!("https://jobs.test/{}", title.to_lowercase().replace(' ', "-")),
            salary: salary.unwrap_or_default().into(),
            ..JobCandidate::captured_at(Utc::now())
        }
        .into_job(JobId::new())
    }

    fn salaries(jobs: &[Job]) -> Vec<Option<&str>> {
        jobs.iter().map(|j| j.salary.as_deref()).collect()
    }

    fn titles(jobs: &[Job]) -> Vec<&str> {
        jobs.iter().map(|j| j.title.as_str()).collect()
    }

    #[test]
    fn highest_drops_missing_and_sorts_descending() {
        let jobs = vec![
            job("A", Some("$50k")),
            job("B", Some("$120k")),
            job("C", None),
            job("D", Some("$80k")),
        ];
        let out = view(
            &jobs,
            &ViewOptions {
                order: SalaryOrder::Highest,
                keyword: String::new(),
            },
        );
        assert_eq!(salaries(&out), vec![Some("$120k"), Some("$80k"), Some("$50k")]);
    }

    #[test]
    fn lowest_is_ascending_and_stable() {
        let jobs = vec![
            job("A", Some("💰 $90k")),
            job("B", Some("💰 $60k - $90k")),
            job("C", Some("$70,000")),
        ];
        let out = view(
            &jobs,
            &ViewOptions {
                order: SalaryOrder::Lowest,
                keyword: String::new(),
            },
        );
        assert_eq!(titles(&out), vec!["C", "A", "B"]);
    }

    #[test]
    fn all_keeps_input_order_including_missing() {
        let jobs = vec![job("A", None), job("B", Some("$1k"))];
        let out = view(&jobs, &ViewOptions::default());
        assert_eq!(titles(&out), vec!["A", "B"]);
    }

    #[test]
    fn keyword_matches_title_case_insensitively() {
        let jobs = vec![
            job("Senior Engineer", Some("$100k")),
            job("Product Manager", Some("$100k")),
        ];
        let out = view(
            &jobs,
            &ViewOptions {
                order: SalaryOrder::All,
                keyword: "engineer".into(),
            },
        );
        assert_eq!(titles(&out), vec!["Senior Engineer"]);
    }

    #[test]
    fn keyword_whitespace_is_significant() {
        let jobs = vec![job("Senior Engineer", Some("$100k"))];
        let options = |keyword: &str| ViewOptions {
            order: SalaryOrder::All,
            keyword: keyword.into(),
        };
        assert!(view(&jobs, &options("engineer ")).is_empty());
        assert_eq!(titles(&view(&jobs, &options("r eng"))), vec!["Senior Engineer"]);
    }

    #[test]
    fn keyword_does_not_match_company() {
        let jobs = vec![job("Designer", Some("$90k"))];
        let out = view(
            &jobs,
            &ViewOptions {
                order: SalaryOrder::All,
                keyword: "acme".into(),
            },
        );
        assert!(out.is_empty());
    }

    #[test]
    fn board_rederives_from_base() {
        let mut board = JobBoard::new(vec![
            job("Rust Engineer", Some("$90k")),
            job("Go Engineer", Some("$120k")),
            job("Designer", Some("$70k")),
        ]);

        board.set_keyword("rust");
        assert_eq!(titles(board.visible()), vec!["Rust Engineer"]);

        // A second keyword starts from the sorted base, not from "rust" results.
        board.set_keyword("go");
        assert_eq!(titles(board.visible()), vec!["Go Engineer"]);

        board.set_keyword("engineer");
        board.set_order(SalaryOrder::Highest);
        assert_eq!(titles(board.visible()), vec!["Go Engineer", "Rust Engineer"]);

        board.set_keyword("");
        assert_eq!(titles(board.visible()), vec!["Go Engineer", "Rust Engineer", "Designer"]);
        assert_eq!(board.base().len(), 3);
        assert_eq!(board.options().order, SalaryOrder::Highest);
    }

    #[test]
    fn parse_order() {
        assert_eq!("Highest".parse::<SalaryOrder>().unwrap(), SalaryOrder::Highest);
        assert_eq!("lowest".parse::<SalaryOrder>().unwrap(), SalaryOrder::Lowest);
        assert!("cheapest".parse::<SalaryOrder>().is_err());
        assert_eq!(SalaryOrder::All.to_string(), "all");
    }

    #[tokio::test]
    async fn recent_jobs_uses_inclusive_window() {
        let tmp = std::env::temp_dir().join(format!("rj_view_test_{}.db", Uuid::now_v7()));
        let store = Storage::open(&tmp).await.unwrap();
        let now = Utc::now();

        let at = |title: &str, age: Duration, salary: &str| JobCandidate {
            title: title.into(),
            company: "Acme".into(),
            url: format!("https://jobs.test/{title}"),
            salary: salary.into(),
            ..JobCandidate::captured_at(now - age)
        };
        store
            .insert_jobs(&[
                at("edge", Duration::hours(24), "$80k"),
                at("stale", Duration::hours(24) + Duration::seconds(1), "$80k"),
                at("fresh", Duration::minutes(5), "$90k"),
                at("unpaid", Duration::minutes(5), ""),
            ])
            .await
            .unwrap();

        let jobs = recent_jobs(&store, Duration::hours(24), now).await.unwrap();
        assert_eq!(titles(&jobs), vec!["fresh", "edge"]);
    }
}
