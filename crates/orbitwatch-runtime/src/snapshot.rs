//! Immutable catalog snapshots and the cell that publishes them.
//!
//! A [`Snapshot`] is built off to the side and then swapped in as a whole.
//! Readers clone the current `Arc` once per request and keep using that
//! reference, so they never see objects from two different refreshes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use orbitwatch_core::{Category, TrajectoryCadence};
use orbitwatch_propagate::{trajectory_times, KinematicState, Propagator, TrajectorySample};
use orbitwatch_store::OrbitalObject;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::types::{SkipReason, SkippedObject};

/// Computed state for one catalog object.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub object: OrbitalObject,
    pub state: KinematicState,
    pub trajectory: Vec<TrajectorySample>,
}

/// Point-in-time view of the catalog with computed state.
#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    epoch: DateTime<Utc>,
    entries: Vec<SnapshotEntry>,
    by_name: HashMap<String, usize>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            version: 0,
            epoch: Utc::now(),
            entries: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    fn new(version: u64, epoch: DateTime<Utc>, entries: Vec<SnapshotEntry>) -> Self {
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.object.name.clone(), i))
            .collect();
        Self {
            version,
            epoch,
            entries,
            by_name,
        }
    }

    /// Monotonic build number; `0` is the empty boot snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The single epoch every entry was computed at.
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in catalog id order.
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&SnapshotEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn iter_category(&self, category: Category) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries
            .iter()
            .filter(move |e| e.object.category == category)
    }
}

/// Result of a snapshot build.
pub struct SnapshotBuild {
    pub snapshot: Snapshot,
    /// Objects whose propagation failed; they stay in the catalog store.
    pub excluded: Vec<SkippedObject>,
}

/// Compute state and trajectory for every object at one shared `epoch`.
///
/// Per-object propagation failures exclude that object only.
pub fn build_snapshot(
    objects: Vec<OrbitalObject>,
    propagator: &dyn Propagator,
    cadence: TrajectoryCadence,
    epoch: DateTime<Utc>,
    version: u64,
) -> SnapshotBuild {
    let times = trajectory_times(epoch, cadence);
    let mut entries = Vec::with_capacity(objects.len());
    let mut excluded = Vec::new();

    for object in objects {
        let computed = propagator
            .propagate(&object.elements, epoch)
            .and_then(|current| {
                let samples = propagator.propagate_many(&object.elements, &times)?;
                Ok((current, samples))
            });

        match computed {
            Ok((current, samples)) => {
                let trajectory = samples
                    .iter()
                    .enumerate()
                    .map(|(i, s)| TrajectorySample {
                        offset_minutes: i as u32 * cadence.step_minutes,
                        position_km: s.position_km,
                    })
                    .collect();
                entries.push(SnapshotEntry {
                    state: KinematicState::from_state_vector(&current, epoch),
                    trajectory,
                    object,
                });
            }
            Err(e) => {
                warn!("Excluding {} from snapshot {}: {}", object.name, version, e);
                excluded.push(SkippedObject {
                    name: object.name,
                    reason: SkipReason::Propagation,
                    detail: e.to_string(),
                });
            }
        }
    }

    info!(
        "Built snapshot {}: {} objects, {} excluded, epoch {}",
        version,
        entries.len(),
        excluded.len(),
        epoch.to_rfc3339()
    );

    SnapshotBuild {
        snapshot: Snapshot::new(version, epoch, entries),
        excluded,
    }
}

/// Holder of the current snapshot.
///
/// The lock is only held for the pointer clone or swap, never across a
/// request or a build.
pub struct SnapshotCell {
    current: RwLock<Arc<Snapshot>>,
    next_version: AtomicU64,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            next_version: AtomicU64::new(1),
        }
    }

    /// The snapshot readers should use for the whole of one request.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Reserve the version number for the next build.
    pub fn next_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish `snapshot`, returning the one it replaced.
    pub fn install(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}
