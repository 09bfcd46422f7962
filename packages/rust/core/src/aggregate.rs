//! Merge per-source results into one candidate batch.

use tracing::debug;

use remotejobs_shared::{JobCandidate, Result};

/// What one source produced during a refresh.
#[derive(Debug)]
pub struct SourceOutcome {
    /// Source name, as reported by the source itself.
    pub source: String,
    pub result: Result<Vec<JobCandidate>>,
}

impl SourceOutcome {
    pub fn new(source: impl Into<String>, result: Result<Vec<JobCandidate>>) -> Self {
        Self {
            source: source.into(),
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Concatenate the successful outcomes in order, dropping invalid candidates.
///
/// Failed outcomes contribute nothing. Duplicates are kept; storage resolves
/// them on insert.
pub fn aggregate(outcomes: &[SourceOutcome]) -> Vec<JobCandidate> {
    let mut merged = Vec::new();

    for outcome in outcomes {
        let Ok(candidates) = &outcome.result else {
            continue;
        };

        let before = merged.len();
        merged.extend(candidates.iter().filter(|c| c.is_valid()).cloned());
        let kept = merged.len() - before;

        debug!(
            source = %outcome.source,
            kept,
            discarded = candidates.len() - kept,
            "source candidates filtered"
        );
    }

    merged
}
