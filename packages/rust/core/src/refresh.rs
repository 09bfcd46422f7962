//! The ingestion gateway: fetch every source, aggregate, persist.

use std::fmt;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{info, instrument, warn};

use remotejobs_scrapers::{Fetcher, SourceRegistry};
use remotejobs_shared::{FailurePolicy, JobCandidate, RemoteJobsError, Result};
use remotejobs_storage::Storage;

use crate::aggregate::{SourceOutcome, aggregate};

/// Where a refresh run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Pending,
    Fetching,
    Aggregating,
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Fetching => "Fetching job boards",
            Self::Aggregating => "Aggregating candidates",
            Self::Persisting => "Saving jobs",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Progress callback for reporting refresh status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every phase transition.
    fn phase(&self, phase: RefreshPhase);
    /// Called once per source after its fetch settles.
    fn source_finished(&self, outcome: &SourceOutcome);
    /// Called when the refresh completes successfully.
    fn done(&self, report: &RefreshReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _phase: RefreshPhase) {}
    fn source_finished(&self, _outcome: &SourceOutcome) {}
    fn done(&self, _report: &RefreshReport) {}
}

/// Options for a single refresh run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    pub policy: FailurePolicy,
    /// Run every phase except persisting.
    pub dry_run: bool,
}

/// A source that failed during an isolated refresh.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    pub message: String,
}

/// Result of a refresh run.
#[derive(Debug)]
pub struct RefreshReport {
    /// Rows newly written to the store.
    pub inserted: usize,
    /// Rows skipped because their URL was already stored.
    pub skipped: usize,
    /// Every aggregated candidate, not only the newly inserted ones.
    pub jobs: Vec<JobCandidate>,
    /// Sources that failed under the isolate policy.
    pub failed: Vec<SourceFailure>,
    /// Number of sources that were run.
    pub source_count: usize,
    pub dry_run: bool,
    pub elapsed: Duration,
}

impl RefreshReport {
    /// Rows either inserted or skipped.
    pub fn processed(&self) -> usize {
        self.inserted + self.skipped
    }

    /// Whether every source that ran failed.
    pub fn all_failed(&self) -> bool {
        self.source_count > 0 && self.failed.len() == self.source_count
    }
}

/// Run one refresh over every registered source.
///
/// Sources are fetched concurrently on the current task. Under
/// [`FailurePolicy::FailFast`] the first failing source (in registry order)
/// aborts the run with [`RemoteJobsError::SourceFailed`] before anything is
/// written. `store` may be `None` only for a dry run.
#[instrument(skip_all, fields(sources = registry.len(), policy = %options.policy, dry_run = options.dry_run))]
pub async fn refresh(
    registry: &SourceRegistry,
    fetcher: &Fetcher,
    store: Option<&Storage>,
    options: RefreshOptions,
    progress: &dyn ProgressReporter,
) -> Result<RefreshReport> {
    let start = Instant::now();
    progress.phase(RefreshPhase::Pending);

    let store = match (options.dry_run, store) {
        (true, _) => None,
        (false, Some(store)) => Some(store),
        (false, None) => {
            progress.phase(RefreshPhase::Failed);
            return Err(RemoteJobsError::validation(
                "a persisting refresh needs a store",
            ));
        }
    };

    info!(sources = ?registry.names(), "starting refresh");

    // --- Phase 1: Fetch ---
    progress.phase(RefreshPhase::Fetching);
    let outcomes: Vec<SourceOutcome> = join_all(registry.iter().map(|source| async move {
        let outcome = SourceOutcome::new(source.name(), source.fetch(fetcher).await);
        progress.source_finished(&outcome);
        outcome
    }))
    .await;

    let mut failed = Vec::new();
    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            if options.policy == FailurePolicy::FailFast {
                progress.phase(RefreshPhase::Failed);
                return Err(RemoteJobsError::SourceFailed {
                    source_name: outcome.source.clone(),
                    message: e.to_string(),
                });
            }
            warn!(source = %outcome.source, error = %e, "source failed, continuing with the others");
            failed.push(SourceFailure {
                source: outcome.source.clone(),
                message: e.to_string(),
            });
        }
    }

    // --- Phase 2: Aggregate ---
    progress.phase(RefreshPhase::Aggregating);
    let jobs = aggregate(&outcomes);
    info!(candidates = jobs.len(), failed = failed.len(), "sources aggregated");

    // --- Phase 3: Persist ---
    let mut inserted = 0;
    let mut skipped = 0;
    if let Some(store) = store {
        progress.phase(RefreshPhase::Persisting);
        match store.insert_jobs(&jobs).await {
            Ok(summary) => {
                inserted = summary.inserted;
                skipped = summary.skipped;
            }
            Err(e) => {
                progress.phase(RefreshPhase::Failed);
                return Err(e);
            }
        }
    }

    let report = RefreshReport {
        inserted,
        skipped,
        jobs,
        failed,
        source_count: outcomes.len(),
        dry_run: options.dry_run,
        elapsed: start.elapsed(),
    };

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "refresh complete"
    );

    progress.phase(RefreshPhase::Done);
    progress.done(&report);
    Ok(report)
}
