//! Kinematic state, subpoint geometry and trajectory sampling.

use chrono::{DateTime, Duration, Utc};
use orbitwatch_core::TrajectoryCadence;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for altitude.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// WGS-84, for geodetic latitude only.
const WGS84_A_KM: f64 = 6378.137;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Raw propagator output in the Earth-centred inertial frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

impl StateVector {
    pub fn radius_km(&self) -> f64 {
        norm(&self.position_km)
    }

    pub fn speed_km_s(&self) -> f64 {
        norm(&self.velocity_km_s)
    }

    pub fn is_finite(&self) -> bool {
        self.position_km
            .iter()
            .chain(self.velocity_km_s.iter())
            .all(|v| v.is_finite())
    }
}

/// Latitude/longitude directly below an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Subpoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// Derived state of one object at one epoch. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub epoch: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub speed_km_s: f64,
    /// Distance from Earth's centre minus [`EARTH_RADIUS_KM`].
    pub altitude_km: f64,
    pub subpoint: Subpoint,
}

impl KinematicState {
    pub fn from_state_vector(state: &StateVector, epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            position_km: state.position_km,
            velocity_km_s: state.velocity_km_s,
            speed_km_s: state.speed_km_s(),
            altitude_km: state.radius_km() - EARTH_RADIUS_KM,
            subpoint: subpoint(&state.position_km, epoch),
        }
    }
}

/// One point of a predicted trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub offset_minutes: u32,
    pub position_km: [f64; 3],
}

/// Sample times for a trajectory starting at `epoch` (offset 0 included).
pub fn trajectory_times(epoch: DateTime<Utc>, cadence: TrajectoryCadence) -> Vec<DateTime<Utc>> {
    (0..cadence.samples)
        .map(|i| epoch + Duration::minutes(i as i64 * i64::from(cadence.step_minutes)))
        .collect()
}

/// Greenwich mean sidereal time in radians.
pub fn gmst_rad(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + f64::from(t.timestamp_subsec_micros()) / 1.0e6;
    let jd = seconds / 86_400.0 + 2_440_587.5;
    let d = jd - 2_451_545.0;
    let c = d / 36_525.0;
    let deg = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * c * c
        - c * c * c / 38_710_000.0;
    deg.rem_euclid(360.0).to_radians()
}

/// Geodetic subpoint of an inertial position at `epoch`.
pub fn subpoint(position_km: &[f64; 3], epoch: DateTime<Utc>) -> Subpoint {
    let [x, y, z] = *position_km;
    let longitude = (y.atan2(x) - gmst_rad(epoch)).to_degrees();

    let e2 = WGS84_F * (2.0 - WGS84_F);
    let p = x.hypot(y);
    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..5 {
        let sin_lat = lat.sin();
        let n = WGS84_A_KM / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        lat = (z + e2 * n * sin_lat).atan2(p);
    }

    Subpoint {
        latitude_deg: lat.to_degrees(),
        longitude_deg: wrap_180(longitude),
    }
}

fn wrap_180(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
