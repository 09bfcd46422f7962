//! Shared types, error model, salary normalization, and configuration for remotejobs.
//!
//! This crate is the foundation depended on by all other remotejobs crates:
//! the [`RemoteJobsError`] enum, the domain types ([`Job`], [`JobCandidate`],
//! [`JobId`]), salary normalization shared by ingestion and the read path,
//! and configuration loading.

pub mod config;
pub mod error;
pub mod salary;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FailurePolicy, FetchConfig, HttpConfig, RefreshConfig, SourceEntry, SourcesConfig,
    StorageConfig, config_dir, config_file_path, init_config, init_config_at, load_config,
    load_config_from,
};
pub use error::{RemoteJobsError, Result};
pub use salary::{SALARY_MARKER, SalaryPattern, normalize, with_marker};
pub use types::{Job, JobCandidate, JobId};
