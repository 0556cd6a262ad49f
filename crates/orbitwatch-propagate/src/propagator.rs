//! Propagator trait and the SGP4 implementation.

use chrono::{DateTime, Utc};
use orbitwatch_core::{ElementPair, Error, Result};
use sgp4::{Constants, Elements, MinutesSinceEpoch};

use crate::state::StateVector;

/// Orbit-propagation capability.
///
/// Implementations must be deterministic for a given element pair and time.
pub trait Propagator: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Check that `elements` can build a propagatable state.
    /// Fails with [`Error::Validation`].
    fn validate(&self, elements: &ElementPair) -> Result<()>;

    /// Position and velocity at `at`. Fails with [`Error::Propagation`].
    fn propagate(&self, elements: &ElementPair, at: DateTime<Utc>) -> Result<StateVector>;

    /// Propagate to several times; fails as a whole if any time fails.
    fn propagate_many(
        &self,
        elements: &ElementPair,
        times: &[DateTime<Utc>],
    ) -> Result<Vec<StateVector>> {
        times.iter().map(|t| self.propagate(elements, *t)).collect()
    }
}

/// SGP4/SDP4 propagation through the `sgp4` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sgp4Propagator;

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self
    }

    fn prepare(elements: &ElementPair) -> std::result::Result<(Elements, Constants), String> {
        let parsed = Elements::from_tle(
            None,
            elements.line1.as_bytes(),
            elements.line2.as_bytes(),
        )
        .map_err(|e| format!("element parse failed: {}", e))?;
        let constants = Constants::from_elements(&parsed)
            .map_err(|e| format!("initialisation failed: {}", e))?;
        Ok((parsed, constants))
    }

    fn run(
        parsed: &Elements,
        constants: &Constants,
        at: DateTime<Utc>,
    ) -> Result<StateVector> {
        let minutes = (at.naive_utc() - parsed.datetime).num_milliseconds() as f64 / 60_000.0;
        let prediction = constants
            .propagate(MinutesSinceEpoch(minutes))
            .map_err(|e| Error::Propagation(format!("{:.1} min from epoch: {}", minutes, e)))?;

        let state = StateVector {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        };
        if !state.is_finite() {
            return Err(Error::Propagation(format!(
                "non-finite state {:.1} min from epoch",
                minutes
            )));
        }
        Ok(state)
    }
}

impl Propagator for Sgp4Propagator {
    fn name(&self) -> &'static str {
        "sgp4"
    }

    fn validate(&self, elements: &ElementPair) -> Result<()> {
        let (_, constants) = Self::prepare(elements).map_err(Error::Validation)?;
        // The state at the element epoch must itself be computable.
        constants
            .propagate(MinutesSinceEpoch(0.0))
            .map_err(|e| Error::Validation(format!("no state at epoch: {}", e)))?;
        Ok(())
    }

    fn propagate(&self, elements: &ElementPair, at: DateTime<Utc>) -> Result<StateVector> {
        let (parsed, constants) = Self::prepare(elements).map_err(Error::Propagation)?;
        Self::run(&parsed, &constants, at)
    }

    fn propagate_many(
        &self,
        elements: &ElementPair,
        times: &[DateTime<Utc>],
    ) -> Result<Vec<StateVector>> {
        let (parsed, constants) = Self::prepare(elements).map_err(Error::Propagation)?;
        times
            .iter()
            .map(|t| Self::run(&parsed, &constants, *t))
            .collect()
    }
}
