//! Test doubles shared by the runtime unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orbitwatch_core::{ElementPair, Error, Result, SourceGroup};
use orbitwatch_ingest::element_checksum;
use orbitwatch_propagate::{Propagator, StateVector};

pub const ORBIT_RADIUS_KM: f64 = 7000.0;

/// Element lines with a valid checksum for `catalog`.
pub fn element_lines(catalog: u32) -> (String, String) {
    let l1 = format!(
        "1 {:05}U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  292",
        catalog
    );
    let l2 = format!(
        "2 {:05}  51.6416 247.4627 0006703 130.5360 325.0288 15.7212539156353",
        catalog
    );
    (with_checksum(l1), with_checksum(l2))
}

fn with_checksum(mut line: String) -> String {
    let digit = element_checksum(&line);
    line.push(char::from(b'0' + digit));
    line
}

pub fn tle_block(name: &str, catalog: u32) -> String {
    let (l1, l2) = element_lines(catalog);
    format!("{}\n{}\n{}\n", name, l1, l2)
}

pub fn tle_block_bare(catalog: u32) -> String {
    let (l1, l2) = element_lines(catalog);
    format!("{}\n{}\n", l1, l2)
}

/// Deterministic circular equatorial orbit.
///
/// Rejects catalog numbers starting with `9` at validation and fails to
/// propagate catalog numbers starting with `8`.
pub struct FakePropagator;

impl Propagator for FakePropagator {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn validate(&self, elements: &ElementPair) -> Result<()> {
        match elements.catalog_number() {
            Some(n) if n.starts_with('9') => Err(Error::Validation(format!("{} rejected", n))),
            Some(_) => Ok(()),
            None => Err(Error::Validation("no catalog number".into())),
        }
    }

    fn propagate(&self, elements: &ElementPair, at: DateTime<Utc>) -> Result<StateVector> {
        if elements
            .catalog_number()
            .map_or(true, |n| n.starts_with('8'))
        {
            return Err(Error::Propagation("decayed".into()));
        }
        let minutes = at.timestamp() as f64 / 60.0;
        let angle = minutes * 0.07;
        Ok(StateVector {
            position_km: [
                ORBIT_RADIUS_KM * angle.cos(),
                ORBIT_RADIUS_KM * angle.sin(),
                0.0,
            ],
            velocity_km_s: [-7.5 * angle.sin(), 7.5 * angle.cos(), 0.0],
        })
    }
}

/// Serves canned bodies per group name, optionally after a delay.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, std::result::Result<String, String>>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, group: &str, body: impl Into<String>) -> Self {
        self.bodies.insert(group.to_string(), Ok(body.into()));
        self
    }

    pub fn with_failure(mut self, group: &str, message: &str) -> Self {
        self.bodies.insert(group.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl crate::fetch::SourceFetcher for FakeFetcher {
    async fn fetch(&self, group: &SourceGroup) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.bodies.get(&group.name) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(msg)) => Err(Error::Fetch(msg.clone())),
            None => Err(Error::Fetch(format!("no body for {}", group.name))),
        }
    }
}
