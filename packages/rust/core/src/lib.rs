//! Refresh orchestration and the read path for remotejobs.
//!
//! This crate ties the scrapers and the store together: [`refresh`] runs
//! every source, aggregates and persists the candidates, and [`view`] sorts
//! and filters what the store hands back.

pub mod aggregate;
pub mod refresh;
pub mod view;

pub use aggregate::{SourceOutcome, aggregate};
pub use refresh::{
    ProgressReporter, RefreshOptions, RefreshPhase, RefreshReport, SilentProgress, SourceFailure,
    refresh,
};
pub use view::{JobBoard, SalaryOrder, ViewOptions, recent_jobs, view};
