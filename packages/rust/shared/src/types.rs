//! Core domain types for the job catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for stored job identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generate a new time-sortable job identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// JobCandidate
// ---------------------------------------------------------------------------

/// A job posting produced by a source, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCandidate {
    /// Display title.
    pub title: String,
    /// Hiring company.
    pub company: String,
    /// Absolute posting URL; the natural key in the store.
    pub url: String,
    /// When the posting was captured.
    pub date: DateTime<Utc>,
    /// Absolute logo URL, or empty.
    #[serde(default)]
    pub logo: String,
    /// Raw salary text prefixed with the salary marker, or empty.
    #[serde(default)]
    pub salary: String,
}

impl JobCandidate {
    /// An empty candidate captured at `date`; extractors fill in what they find.
    pub fn captured_at(date: DateTime<Utc>) -> Self {
        Self {
            title: String::new(),
            company: String::new(),
            url: String::new(),
            date,
            logo: String::new(),
            salary: String::new(),
        }
    }

    /// Whether `title`, `company`, and `url` are all non-empty.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.company.trim().is_empty()
            && !self.url.trim().is_empty()
    }

    /// Attach a store-assigned identifier.
    pub fn into_job(self, id: JobId) -> Job {
        Job {
            id,
            title: self.title,
            company: self.company,
            url: self.url,
            date: self.date,
            logo: self.logo,
            salary: (!self.salary.is_empty()).then_some(self.salary),
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A persisted job posting, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Store-assigned identifier.
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub url: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub logo: String,
    /// Salary text; `None` when the posting carried none.
    #[serde(default)]
    pub salary: Option<String>,
}

impl Job {
    /// Salary text if present and non-empty.
    pub fn salary_text(&self) -> Option<&str> {
        self.salary.as_deref().filter(|s| !s.trim().is_empty())
    }
}
