//! Runtime types: refresh reports and query response shapes.

use chrono::{DateTime, Utc};
use orbitwatch_core::Category;
use orbitwatch_propagate::Subpoint;
use serde::{Deserialize, Serialize};

/// At most this many skipped objects are itemised per group report.
pub const MAX_ITEMISED_SKIPS: usize = 50;

/// Why an object did not make it into the catalog or snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    /// Element lines failed structural checks.
    Parse,
    /// The propagator could not build a state from the elements.
    Validation,
    /// Another object with the same name was accepted first.
    Duplicate,
    /// Propagation failed while building a snapshot.
    Propagation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedObject {
    pub name: String,
    pub reason: SkipReason,
    pub detail: String,
}

/// How a refresh writes to the catalog store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    Replace,
    Append,
}

/// Per-group cap for one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLimit {
    pub group: String,
    pub max_count: usize,
}

impl GroupLimit {
    pub fn new(group: impl Into<String>, max_count: usize) -> Self {
        Self {
            group: group.into(),
            max_count,
        }
    }
}

/// Outcome of one source group within a refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub max_count: usize,
    /// Fetch or task failure; the group contributed nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub accepted: usize,
    pub skipped_lines: usize,
    pub parse_errors: usize,
    pub validation_errors: usize,
    pub duplicates: usize,
    /// Stopped at `max_count` before the input was exhausted.
    pub capped: bool,
    pub skipped: Vec<SkippedObject>,
}

impl GroupReport {
    pub fn new(group: &str, category: Option<Category>, max_count: usize) -> Self {
        Self {
            group: group.to_string(),
            category,
            max_count,
            ..Default::default()
        }
    }

    pub fn record_skip(&mut self, name: &str, reason: SkipReason, detail: impl Into<String>) {
        match reason {
            SkipReason::Parse => self.parse_errors += 1,
            SkipReason::Validation => self.validation_errors += 1,
            SkipReason::Duplicate => self.duplicates += 1,
            SkipReason::Propagation => {}
        }
        if self.skipped.len() < MAX_ITEMISED_SKIPS {
            self.skipped.push(SkippedObject {
                name: name.to_string(),
                reason,
                detail: detail.into(),
            });
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Identity of a freshly installed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub version: u64,
    pub epoch: DateTime<Utc>,
    pub objects: usize,
    /// Catalog objects left out because propagation failed.
    pub excluded: Vec<SkippedObject>,
}

/// Outcome of a completed refresh or ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub mode: RefreshMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub groups: Vec<GroupReport>,
    /// Objects written to the catalog store by this refresh.
    pub stored: usize,
    /// Catalog rows after the write.
    pub catalog_size: usize,
    pub snapshot: SnapshotSummary,
}

impl RefreshReport {
    pub fn accepted(&self) -> usize {
        self.groups.iter().map(|g| g.accepted).sum()
    }

    pub fn failed_groups(&self) -> usize {
        self.groups.iter().filter(|g| g.failed()).count()
    }
}

/// One row of `GET /api/objects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub position: [f64; 3],
    pub orbit: Vec<[f64; 3]>,
}

/// Body of `GET /api/object/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetail {
    pub name: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub tle1: String,
    pub tle2: String,
    pub current_position_km: [f64; 3],
    /// vx, vy, vz, magnitude.
    pub velocity_km_s: [f64; 4],
    pub altitude_km: f64,
    pub subpoint: Subpoint,
}
