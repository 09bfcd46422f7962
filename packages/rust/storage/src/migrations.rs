//! SQL migration definitions for the job catalog database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as one batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: jobs keyed on unique url",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Aggregated job postings. `url` is the natural key.
CREATE TABLE IF NOT EXISTS jobs (
    id       TEXT PRIMARY KEY,
    title    TEXT NOT NULL,
    company  TEXT NOT NULL,
    url      TEXT NOT NULL UNIQUE,
    date     TEXT NOT NULL,
    logo     TEXT NOT NULL DEFAULT '',
    salary   TEXT
);

CREATE INDEX IF NOT EXISTS idx_jobs_date ON jobs(date);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
