//! libSQL storage layer for the job catalog.
//!
//! The [`Storage`] struct wraps a local libSQL database holding every job
//! posting ever ingested. Rows are keyed on a unique `url`; bulk inserts skip
//! rows whose `url` is already known, so repeated or overlapping refreshes are
//! idempotent. There is no update or delete path: the catalog only grows.
//!
//! **Access rules:**
//! - Refresh: read-write via [`Storage::open`]
//! - Read path: [`Storage::open_readonly`] is enough

mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use remotejobs_shared::{Job, JobCandidate, JobId, RemoteJobsError, Result};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Outcome of a bulk insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    /// Rows newly written.
    pub inserted: usize,
    /// Rows skipped because their `url` already existed.
    pub skipped: usize,
}

impl InsertSummary {
    /// Rows either inserted or skipped.
    pub fn processed(&self) -> usize {
        self.inserted + self.skipped
    }
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RemoteJobsError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RemoteJobsError::Storage(format!(
                "database not found at {}; run a refresh first",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        RemoteJobsError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(RemoteJobsError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Job operations
    // -----------------------------------------------------------------------

    /// Insert candidates in one transaction, skipping any whose `url` already exists.
    ///
    /// Existing rows are never overwritten. Each inserted row gets a fresh [`JobId`].
    pub async fn insert_jobs(&self, jobs: &[JobCandidate]) -> Result<InsertSummary> {
        self.check_writable()?;

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        let mut summary = InsertSummary::default();
        for job in jobs {
            let id = JobId::new().to_string();
            let salary = (!job.salary.is_empty()).then_some(job.salary.as_str());
            let changed = tx
                .execute(
                    "INSERT INTO jobs (id, title, company, url, date, logo, salary)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(url) DO NOTHING",
                    params![
                        id.as_str(),
                        job.title.as_str(),
                        job.company.as_str(),
                        job.url.as_str(),
                        format_date(&job.date),
                        job.logo.as_str(),
                        salary,
                    ],
                )
                .await
                .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

            if changed == 0 {
                summary.skipped += 1;
            } else {
                summary.inserted += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        tracing::debug!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            "bulk insert committed"
        );
        Ok(summary)
    }

    /// Jobs captured at or after `since` that carry a non-empty salary, newest first.
    pub async fn list_recent_with_salary(&self, since: DateTime<Utc>) -> Result<Vec<Job>> {
        let since = format_date(&since);
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, company, url, date, logo, salary
                 FROM jobs
                 WHERE date >= ?1 AND salary IS NOT NULL AND salary != ''
                 ORDER BY date DESC, rowid ASC",
                params![since.as_str()],
            )
            .await
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_job(&row)?);
        }
        Ok(results)
    }

    /// Look up a job by its posting URL.
    pub async fn get_job_by_url(&self, url: &str) -> Result<Option<Job>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, company, url, date, logo, salary FROM jobs WHERE url = ?1",
                params![url],
            )
            .await
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_job(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(RemoteJobsError::Storage(e.to_string())),
        }
    }

    /// Total number of stored jobs.
    pub async fn count_jobs(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM jobs", params![])
            .await
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row
                .get::<i64>(0)
                .map_err(|e| RemoteJobsError::Storage(e.to_string()))? as usize),
            Ok(None) => Ok(0),
            Err(e) => Err(RemoteJobsError::Storage(e.to_string())),
        }
    }
}

/// Fixed-width RFC 3339 so that string comparison in SQL is chronological.
fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert a database row to a [`Job`].
fn row_to_job(row: &libsql::Row) -> Result<Job> {
    let id: String = row
        .get(0)
        .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;
    let date: String = row
        .get(4)
        .map_err(|e| RemoteJobsError::Storage(e.to_string()))?;

    Ok(Job {
        id: id
            .parse()
            .map_err(|e| RemoteJobsError::parse(format!("invalid job id {id}: {e}")))?,
        title: row
            .get::<String>(1)
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?,
        company: row
            .get::<String>(2)
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?,
        url: row
            .get::<String>(3)
            .map_err(|e| RemoteJobsError::Storage(e.to_string()))?,
        date: DateTime::parse_from_rfc3339(&date)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RemoteJobsError::parse(format!("invalid date {date}: {e}")))?,
        logo: row.get::<String>(5).unwrap_or_default(),
        salary: row.get::<String>(6).ok().filter(|s| !s.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("rj_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn candidate(url: &str, salary: &str, date: DateTime<Utc>) -> JobCandidate {
        JobCandidate {
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            url: url.into(),
            date,
            logo: String::new(),
            salary: salary.into(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("rj_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn duplicate_url_is_skipped_not_overwritten() {
        let storage = test_storage().await;
        let now = Utc::now();

        let first = candidate("https://example.com/jobs/1", "💰 $90k", now);
        let summary = storage.insert_jobs(&[first.clone()]).await.expect("insert");
        assert_eq!(summary, InsertSummary { inserted: 1, skipped: 0 });

        let mut again = first.clone();
        again.title = "Renamed".into();
        let summary = storage.insert_jobs(&[again]).await.expect("insert again");
        assert_eq!(summary, InsertSummary { inserted: 0, skipped: 1 });
        assert_eq!(summary.processed(), 1);

        assert_eq!(storage.count_jobs().await.unwrap(), 1);
        let stored = storage
            .get_job_by_url("https://example.com/jobs/1")
            .await
            .unwrap()
            .expect("stored job");
        assert_eq!(stored.title, "Backend Engineer");
    }

    #[tokio::test]
    async fn duplicates_within_one_batch() {
        let storage = test_storage().await;
        let now = Utc::now();
        let job = candidate("https://example.com/jobs/dup", "", now);

        let summary = storage
            .insert_jobs(&[job.clone(), job.clone(), job])
            .await
            .expect("insert batch");
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(storage.count_jobs().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_salary_stored_as_absent() {
        let storage = test_storage().await;
        storage
            .insert_jobs(&[candidate("https://example.com/jobs/2", "", Utc::now())])
            .await
            .unwrap();

        let job = storage
            .get_job_by_url("https://example.com/jobs/2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.salary, None);
    }

    #[tokio::test]
    async fn recent_window_is_inclusive_and_requires_salary() {
        let storage = test_storage().await;
        let now = Utc::now();
        let since = now - Duration::hours(24);

        storage
            .insert_jobs(&[
                candidate("https://example.com/jobs/fresh", "💰 $100k", now),
                candidate("https://example.com/jobs/boundary", "💰 $80k", since),
                candidate(
                    "https://example.com/jobs/stale",
                    "💰 $120k",
                    since - Duration::seconds(1),
                ),
                candidate("https://example.com/jobs/unpaid", "", now),
            ])
            .await
            .unwrap();

        let recent = storage.list_recent_with_salary(since).await.unwrap();
        let urls: Vec<&str> = recent.iter().map(|j| j.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/jobs/fresh",
                "https://example.com/jobs/boundary"
            ]
        );
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("rj_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.insert_jobs(&[candidate("https://example.com/jobs/3", "", Utc::now())])
            .await
            .unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.count_jobs().await.unwrap(), 1);
        let result = ro
            .insert_jobs(&[candidate("https://example.com/jobs/4", "", Utc::now())])
            .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_file() {
        let tmp = std::env::temp_dir().join(format!("rj_missing_{}.db", Uuid::now_v7()));
        assert!(Storage::open_readonly(&tmp).await.is_err());
    }
}
