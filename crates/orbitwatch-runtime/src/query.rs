//! Read-only queries over the current snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use orbitwatch_core::{Category, Error, Result};
use orbitwatch_propagate::{KinematicState, Propagator, Subpoint};
use tracing::debug;

use crate::snapshot::{SnapshotCell, SnapshotEntry};
use crate::types::{CatalogEntry, ObjectDetail};

pub struct QueryService {
    snapshots: Arc<SnapshotCell>,
    propagator: Arc<dyn Propagator>,
}

impl QueryService {
    pub fn new(snapshots: Arc<SnapshotCell>, propagator: Arc<dyn Propagator>) -> Self {
        Self {
            snapshots,
            propagator,
        }
    }

    /// Catalog listing from the current snapshot, optionally restricted to
    /// one category.
    pub fn list_catalog(&self, filter: Option<Category>) -> Vec<CatalogEntry> {
        let snapshot = self.snapshots.current();
        snapshot
            .entries()
            .iter()
            .filter(|e| filter.map_or(true, |c| e.object.category == c))
            .map(catalog_entry)
            .collect()
    }

    /// Detail for `name`, with state computed now rather than taken from
    /// the snapshot.
    pub fn object_detail(&self, name: &str) -> Result<ObjectDetail> {
        self.object_detail_at(name, Utc::now())
    }

    pub fn object_detail_at(&self, name: &str, at: DateTime<Utc>) -> Result<ObjectDetail> {
        let snapshot = self.snapshots.current();
        let entry = snapshot
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Object '{}' not found", name)))?;

        let state = self
            .propagator
            .propagate(&entry.object.elements, at)
            .map_err(|e| {
                debug!("Detail propagation for {} failed: {}", name, e);
                match e {
                    Error::Propagation(_) => e,
                    other => Error::Propagation(other.to_string()),
                }
            })?;
        let kinematic = KinematicState::from_state_vector(&state, at);

        let v = kinematic.velocity_km_s;
        Ok(ObjectDetail {
            name: entry.object.name.clone(),
            category: entry.object.category,
            tle1: entry.object.elements.line1.clone(),
            tle2: entry.object.elements.line2.clone(),
            current_position_km: round3(kinematic.position_km),
            velocity_km_s: [
                round2(v[0]),
                round2(v[1]),
                round2(v[2]),
                round2(kinematic.speed_km_s),
            ],
            altitude_km: round2(kinematic.altitude_km),
            subpoint: Subpoint {
                latitude_deg: round2(kinematic.subpoint.latitude_deg),
                longitude_deg: round2(kinematic.subpoint.longitude_deg),
            },
        })
    }
}

fn catalog_entry(entry: &SnapshotEntry) -> CatalogEntry {
    let object = &entry.object;
    CatalogEntry {
        id: object.id,
        name: object.name.clone(),
        description: format!("{}: {}", object.category.label(), object.name),
        category: object.category,
        position: round3(entry.state.position_km),
        orbit: entry
            .trajectory
            .iter()
            .map(|s| round3(s.position_km))
            .collect(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round3(v: [f64; 3]) -> [f64; 3] {
    [round2(v[0]), round2(v[1]), round2(v[2])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::build_snapshot;
    use crate::testing::{element_lines, FakePropagator, ORBIT_RADIUS_KM};
    use chrono::TimeZone;
    use orbitwatch_core::{ElementPair, TrajectoryCadence};
    use orbitwatch_store::OrbitalObject;

    fn object(id: i64, name: &str, catalog: u32, category: Category) -> OrbitalObject {
        let (l1, l2) = element_lines(catalog);
        OrbitalObject {
            id,
            name: name.to_string(),
            elements: ElementPair::new(l1, l2),
            category,
            last_updated: 0,
        }
    }

    fn service(objects: Vec<OrbitalObject>) -> QueryService {
        let cell = Arc::new(SnapshotCell::new());
        let epoch = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let cadence = TrajectoryCadence {
            samples: 10,
            step_minutes: 10,
        };
        let build = build_snapshot(objects, &FakePropagator, cadence, epoch, cell.next_version());
        cell.install(build.snapshot);
        QueryService::new(cell, Arc::new(FakePropagator))
    }

    fn mixed_catalog() -> Vec<OrbitalObject> {
        vec![
            object(1, "DEB A", 30001, Category::Debris),
            object(2, "ISS (ZARYA)", 25544, Category::Satellite),
            object(3, "DEB B", 30002, Category::Debris),
            object(4, "STARLINK-1", 44713, Category::Satellite),
            object(5, "DEB C", 30003, Category::Debris),
        ]
    }

    #[test]
    fn test_filter_returns_only_requested_category() {
        let svc = service(mixed_catalog());
        let debris = svc.list_catalog(Some(Category::Debris));
        assert_eq!(debris.len(), 3);
        assert!(debris.iter().all(|e| e.category == Category::Debris));
        assert_eq!(svc.list_catalog(Some(Category::Satellite)).len(), 2);
        // Filtering does not alter the snapshot.
        assert_eq!(svc.list_catalog(None).len(), 5);
    }

    #[test]
    fn test_catalog_entry_fields() {
        let svc = service(mixed_catalog());
        let all = svc.list_catalog(None);
        let iss = all.iter().find(|e| e.name == "ISS (ZARYA)").unwrap();
        assert_eq!(iss.id, 2);
        assert_eq!(iss.description, "Satellite: ISS (ZARYA)");
        assert_eq!(iss.orbit.len(), 10);
        assert_eq!(iss.orbit[0], iss.position);
        for v in iss.position {
            assert_eq!(v, round2(v));
        }
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let svc = service(mixed_catalog());
        let err = svc.object_detail("NOPE").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_detail_altitude_matches_radius() {
        let svc = service(mixed_catalog());
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 13, 30, 0).unwrap();
        let detail = svc.object_detail_at("DEB B", at).unwrap();

        let p = detail.current_position_km;
        let radius = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        assert!((detail.altitude_km - (radius - 6371.0)).abs() < 0.02);
        assert!((detail.altitude_km - (ORBIT_RADIUS_KM - 6371.0)).abs() < 0.01);
        assert_eq!(detail.velocity_km_s[3], 7.5);
        assert_eq!(detail.tle1, element_lines(30002).0);
        assert_eq!(detail.category, Category::Debris);
        // Equatorial orbit.
        assert!(detail.subpoint.latitude_deg.abs() < 0.01);
    }

    #[test]
    fn test_detail_is_computed_at_request_time() {
        let svc = service(mixed_catalog());
        let a = Utc.with_ymd_and_hms(2026, 10, 18, 13, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 10, 18, 13, 5, 0).unwrap();
        let first = svc.object_detail_at("DEB A", a).unwrap();
        let second = svc.object_detail_at("DEB A", b).unwrap();
        assert_ne!(first.current_position_km, second.current_position_km);
    }

    #[test]
    fn test_detail_propagation_failure() {
        // The propagator can start failing after the snapshot was built.
        struct Failing;
        impl Propagator for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn validate(&self, _: &ElementPair) -> Result<()> {
                Ok(())
            }
            fn propagate(
                &self,
                _: &ElementPair,
                _: DateTime<Utc>,
            ) -> Result<orbitwatch_propagate::StateVector> {
                Err(Error::Propagation("diverged".into()))
            }
        }

        let cell = Arc::new(SnapshotCell::new());
        let build = build_snapshot(
            mixed_catalog(),
            &FakePropagator,
            TrajectoryCadence::default(),
            Utc::now(),
            cell.next_version(),
        );
        cell.install(build.snapshot);
        let svc = QueryService::new(cell, Arc::new(Failing));

        let err = svc.object_detail("DEB A").unwrap_err();
        assert!(matches!(err, Error::Propagation(_)));
    }
}
