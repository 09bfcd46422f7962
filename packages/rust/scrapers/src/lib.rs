//! Job board scraping for remotejobs.
//!
//! [`Fetcher`] owns HTTP policy; each [`JobSource`] turns one board's markup
//! into [`JobCandidate`](remotejobs_shared::JobCandidate)s. The refresh
//! pipeline drives every registered source through a [`SourceRegistry`].

pub mod fetch;
pub mod sources;

pub use fetch::{Fetcher, RequestStyle};
pub use sources::{JobSource, RemoteCo, RemoteOk, SourceRegistry, WeWorkRemotely};
