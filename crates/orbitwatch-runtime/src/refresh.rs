//! Refresh orchestrator: fetch → parse → validate → classify → store → snapshot.
//!
//! At most one refresh (or ingest) runs at a time. A second request made
//! while one is running fails fast with [`Error::RefreshInProgress`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use orbitwatch_core::{Category, Error, Result, SourceGroup, TrajectoryCadence};
use orbitwatch_ingest::ClassificationPolicy;
use orbitwatch_propagate::Propagator;
use orbitwatch_store::{CatalogStore, NewObject, OrbitalObject};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;
use tracing::{error, info, warn};

use crate::fetch::SourceFetcher;
use crate::pipeline::collect_objects;
use crate::snapshot::{build_snapshot, SnapshotCell};
use crate::types::{GroupLimit, GroupReport, RefreshMode, RefreshReport, SnapshotSummary};

/// Group name recorded for ungrouped ingests.
pub const INGEST_GROUP: &str = "ingest";

pub struct RefreshOrchestrator {
    store: Arc<CatalogStore>,
    propagator: Arc<dyn Propagator>,
    fetcher: Arc<dyn SourceFetcher>,
    snapshots: Arc<SnapshotCell>,
    groups: Vec<SourceGroup>,
    cadence: TrajectoryCadence,
    running: Mutex<()>,
    last_report: RwLock<Option<RefreshReport>>,
}

impl RefreshOrchestrator {
    pub fn new(
        store: Arc<CatalogStore>,
        propagator: Arc<dyn Propagator>,
        fetcher: Arc<dyn SourceFetcher>,
        snapshots: Arc<SnapshotCell>,
        groups: Vec<SourceGroup>,
        cadence: TrajectoryCadence,
    ) -> Self {
        Self {
            store,
            propagator,
            fetcher,
            snapshots,
            groups,
            cadence,
            running: Mutex::new(()),
            last_report: RwLock::new(None),
        }
    }

    pub fn snapshots(&self) -> &Arc<SnapshotCell> {
        &self.snapshots
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    pub fn last_report(&self) -> Option<RefreshReport> {
        self.last_report.read().clone()
    }

    /// Each configured group at its default cap.
    pub fn default_limits(&self) -> Vec<GroupLimit> {
        self.groups
            .iter()
            .map(|g| GroupLimit::new(&g.name, g.default_max))
            .collect()
    }

    /// Full refresh: fetch every requested group and replace the catalog.
    ///
    /// A group whose fetch fails contributes nothing and is reported; the
    /// other groups still proceed. When every group fails, or the store
    /// update fails, the refresh aborts with the current catalog and
    /// snapshot left serving.
    pub async fn refresh(&self, limits: &[GroupLimit]) -> Result<RefreshReport> {
        let _guard = self.running.try_lock().map_err(|_| Error::RefreshInProgress)?;
        let started_at = Utc::now();

        let mut targets = Vec::with_capacity(limits.len());
        for limit in limits {
            let group = self
                .groups
                .iter()
                .find(|g| g.name == limit.group)
                .ok_or_else(|| Error::Config(format!("Unknown source group: {}", limit.group)))?;
            targets.push((group.clone(), limit.max_count));
        }

        info!(
            "Refresh started with {} propagator: {}",
            self.propagator.name(),
            targets
                .iter()
                .map(|(g, max)| format!("{} (max {})", g.name, max))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let fetcher = &self.fetcher;
        let fetched = join_all(targets.into_iter().map(|(group, max)| async move {
            let body = fetcher.fetch(&group).await;
            (group, max, body)
        }))
        .await;

        let propagator = self.propagator.clone();
        let (objects, groups) = spawn_blocking(move || process_groups(fetched, propagator.as_ref()))
            .await
            .map_err(|e| Error::Internal(format!("Refresh task failed: {}", e)))?;

        // With no source reachable there is nothing to replace the catalog with.
        if !groups.is_empty() && groups.iter().all(|g| g.error.is_some()) {
            let reasons = groups
                .iter()
                .filter_map(|g| g.error.as_deref())
                .collect::<Vec<_>>()
                .join("; ");
            error!("Refresh aborted, every source group failed: {}", reasons);
            return Err(Error::Fetch(format!("all source groups failed: {}", reasons)));
        }

        let store = self.store.clone();
        let stored = spawn_blocking(move || store.replace_all(&objects))
            .await
            .map_err(|e| Error::Internal(format!("Store task failed: {}", e)))?
            .map_err(|e| {
                error!("Refresh aborted, catalog store update failed: {}", e);
                e
            })?;

        self.finish(RefreshMode::Replace, started_at, groups, stored.len())
            .await
    }

    /// Incremental ingest of raw element text using `append`.
    ///
    /// With a `category` every object takes it; without one names are
    /// classified by keyword.
    pub async fn ingest_text(
        &self,
        text: String,
        category: Option<Category>,
    ) -> Result<RefreshReport> {
        let _guard = self.running.try_lock().map_err(|_| Error::RefreshInProgress)?;
        let started_at = Utc::now();

        let propagator = self.propagator.clone();
        let (objects, report) = spawn_blocking(move || {
            let mut report = GroupReport::new(INGEST_GROUP, category, usize::MAX);
            let mut seen = HashSet::new();
            let objects = collect_objects(
                &text,
                ClassificationPolicy::for_group(category),
                propagator.as_ref(),
                &mut seen,
                &mut report,
            );
            (objects, report)
        })
        .await
        .map_err(|e| Error::Internal(format!("Ingest task failed: {}", e)))?;

        let store = self.store.clone();
        let stored = spawn_blocking(move || store.append(&objects))
            .await
            .map_err(|e| Error::Internal(format!("Store task failed: {}", e)))?
            .map_err(|e| {
                error!("Ingest aborted, catalog store append failed: {}", e);
                e
            })?;

        self.finish(RefreshMode::Append, started_at, vec![report], stored.len())
            .await
    }

    /// Build a snapshot from whatever the store currently holds.
    ///
    /// Used at startup before any refresh has run.
    pub async fn reload(&self) -> Result<SnapshotSummary> {
        let _guard = self.running.try_lock().map_err(|_| Error::RefreshInProgress)?;
        let (summary, _) = self.rebuild_snapshot().await?;
        if summary.objects == 0 {
            warn!("Catalog store is empty; serving an empty snapshot until the first refresh");
        }
        Ok(summary)
    }

    async fn finish(
        &self,
        mode: RefreshMode,
        started_at: chrono::DateTime<Utc>,
        groups: Vec<GroupReport>,
        stored: usize,
    ) -> Result<RefreshReport> {
        let (snapshot, catalog_size) = self.rebuild_snapshot().await?;
        let report = RefreshReport {
            mode,
            started_at,
            finished_at: Utc::now(),
            groups,
            stored,
            catalog_size,
            snapshot,
        };

        info!(
            "Refresh finished ({:?}): {} accepted, {} stored, {} failed groups, snapshot {} with {} objects",
            report.mode,
            report.accepted(),
            report.stored,
            report.failed_groups(),
            report.snapshot.version,
            report.snapshot.objects
        );
        *self.last_report.write() = Some(report.clone());
        Ok(report)
    }

    /// Read the whole catalog, compute states at one epoch, and swap the
    /// result in. Returns the new snapshot's summary and the catalog size.
    async fn rebuild_snapshot(&self) -> Result<(SnapshotSummary, usize)> {
        let store = self.store.clone();
        let propagator = self.propagator.clone();
        let cadence = self.cadence;
        let version = self.snapshots.next_version();

        let build = spawn_blocking(move || -> Result<_> {
            let objects: Vec<OrbitalObject> = store.list_all()?;
            let catalog_size = objects.len();
            let build = build_snapshot(objects, propagator.as_ref(), cadence, Utc::now(), version);
            Ok((build, catalog_size))
        })
        .await
        .map_err(|e| Error::Internal(format!("Snapshot task failed: {}", e)))?;

        let (build, catalog_size) = build.map_err(|e| {
            error!("Snapshot rebuild failed, keeping previous snapshot: {}", e);
            e
        })?;

        let summary = SnapshotSummary {
            version,
            epoch: build.snapshot.epoch(),
            objects: build.snapshot.len(),
            excluded: build.excluded,
        };
        self.snapshots.install(build.snapshot);
        Ok((summary, catalog_size))
    }
}

/// Run every fetched group through the pipeline in request order.
fn process_groups(
    fetched: Vec<(SourceGroup, usize, Result<String>)>,
    propagator: &dyn Propagator,
) -> (Vec<NewObject>, Vec<GroupReport>) {
    let mut objects = Vec::new();
    let mut reports = Vec::with_capacity(fetched.len());
    let mut seen = HashSet::new();

    for (group, max_count, body) in fetched {
        let mut report = GroupReport::new(&group.name, Some(group.category), max_count);
        match body {
            Ok(text) => {
                let accepted = collect_objects(
                    &text,
                    ClassificationPolicy::for_group(Some(group.category)),
                    propagator,
                    &mut seen,
                    &mut report,
                );
                info!(
                    "Group {}: {} accepted, {} lines skipped, {} parse, {} validation, {} duplicate",
                    group.name,
                    report.accepted,
                    report.skipped_lines,
                    report.parse_errors,
                    report.validation_errors,
                    report.duplicates
                );
                objects.extend(accepted);
            }
            Err(e) => {
                warn!("Group {} contributes nothing: {}", group.name, e);
                report.error = Some(e.to_string());
            }
        }
        reports.push(report);
    }

    (objects, reports)
}
