//! Runtime — refresh orchestration, snapshot cache, query service.
//!
//! The refresh orchestrator drives fetch → parse → validate → classify →
//! store, then rebuilds an immutable [`Snapshot`] and swaps it in. The query
//! service only ever reads the current snapshot.

pub mod fetch;
pub mod pipeline;
pub mod query;
pub mod refresh;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod testing;

pub use fetch::{HttpFetcher, SourceFetcher};
pub use query::QueryService;
pub use refresh::{RefreshOrchestrator, INGEST_GROUP};
pub use snapshot::{build_snapshot, Snapshot, SnapshotBuild, SnapshotCell, SnapshotEntry};
pub use types::*;
