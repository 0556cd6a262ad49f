//! OrbitWatch Propagate — orbit propagation capability and derived geometry.
//!
//! Provides the `Propagator` trait used both as an ingest-time validity
//! oracle and for state computation. `Sgp4Propagator` is the production
//! implementation; tests substitute their own.

pub mod propagator;
pub mod state;

pub use propagator::{Propagator, Sgp4Propagator};
pub use state::{
    gmst_rad, subpoint, trajectory_times, KinematicState, StateVector, Subpoint, TrajectorySample,
    EARTH_RADIUS_KM,
};

use std::sync::Arc;

/// Create the production propagator.
pub fn create_propagator() -> Arc<dyn Propagator> {
    let propagator = Sgp4Propagator::new();
    tracing::info!("Using {} propagator", propagator.name());
    Arc::new(propagator)
}
