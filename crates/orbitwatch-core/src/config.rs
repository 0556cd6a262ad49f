//! Configuration and data directory management.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Category;

const DEFAULT_DEBRIS_URL: &str =
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=cosmos-2251-debris&FORMAT=TLE";
const DEFAULT_SATELLITE_URL: &str =
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=active&FORMAT=TLE";

/// Paths to all OrbitWatch data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Catalog database directory (`data/catalog/`).
    pub catalog: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            catalog: root.join("catalog"),
            root,
        };
        std::fs::create_dir_all(&paths.catalog)?;
        Ok(paths)
    }
}

/// A named upstream feed of element sets.
///
/// `category` is the explicit classification flag for every object the
/// group contributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceGroup {
    pub name: String,
    pub category: Category,
    pub url: String,
    pub default_max: usize,
}

/// Trajectory sampling cadence, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrajectoryCadence {
    pub samples: usize,
    pub step_minutes: u32,
}

impl Default for TrajectoryCadence {
    fn default() -> Self {
        Self {
            samples: 90,
            step_minutes: 1,
        }
    }
}

/// Timeout and retry policy for source fetches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FetchPolicy {
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub initial_backoff_ms: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_retries: 2,
            initial_backoff_ms: 500,
        }
    }
}

/// Top-level OrbitWatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitWatchConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Source groups, refreshed in this order.
    pub groups: Vec<SourceGroup>,
    pub cadence: TrajectoryCadence,
    pub fetch: FetchPolicy,
    /// Seconds between background refreshes. `0` disables them.
    pub refresh_interval_secs: u64,
}

impl OrbitWatchConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = env_or("PORT", 5000);
        let default_max = env_or("ORBITWATCH_DEFAULT_MAX", 10);

        let groups = vec![
            SourceGroup {
                name: "debris".to_string(),
                category: Category::Debris,
                url: std::env::var("ORBITWATCH_DEBRIS_URL")
                    .unwrap_or_else(|_| DEFAULT_DEBRIS_URL.to_string()),
                default_max,
            },
            SourceGroup {
                name: "satellite".to_string(),
                category: Category::Satellite,
                url: std::env::var("ORBITWATCH_SATELLITE_URL")
                    .unwrap_or_else(|_| DEFAULT_SATELLITE_URL.to_string()),
                default_max,
            },
        ];

        let defaults = TrajectoryCadence::default();
        let cadence = TrajectoryCadence {
            samples: env_or("ORBITWATCH_TRAJECTORY_SAMPLES", defaults.samples),
            step_minutes: env_or("ORBITWATCH_TRAJECTORY_STEP_MIN", defaults.step_minutes).max(1),
        };

        let defaults = FetchPolicy::default();
        let fetch = FetchPolicy {
            timeout_secs: env_or("ORBITWATCH_FETCH_TIMEOUT_SECS", defaults.timeout_secs).max(1),
            max_retries: env_or("ORBITWATCH_FETCH_RETRIES", defaults.max_retries),
            initial_backoff_ms: env_or("ORBITWATCH_FETCH_BACKOFF_MS", defaults.initial_backoff_ms),
        };

        Ok(Self {
            port,
            data_paths: DataPaths::new(data_dir)?,
            groups,
            cadence,
            fetch,
            refresh_interval_secs: env_or("ORBITWATCH_REFRESH_INTERVAL_SECS", 0),
        })
    }

    /// Look up a source group by name.
    pub fn group(&self, name: &str) -> Option<&SourceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_creates_catalog_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("data")).unwrap();
        assert!(paths.catalog.is_dir());
        assert!(paths.catalog.ends_with("catalog"));
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = OrbitWatchConfig::from_env(dir.path()).unwrap();
        assert_eq!(config.groups.len(), 2);

        let debris = config.group("debris").unwrap();
        assert_eq!(debris.category, Category::Debris);
        let satellite = config.group("satellite").unwrap();
        assert_eq!(satellite.category, Category::Satellite);
        assert!(config.group("rocket-bodies").is_none());

        assert!(config.cadence.samples > 0);
        assert!(config.cadence.step_minutes >= 1);
        assert!(config.fetch.timeout_secs >= 1);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("ORBITWATCH_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("ORBITWATCH_TEST_GARBAGE", 7u32), 7);
        std::env::set_var("ORBITWATCH_TEST_GARBAGE", " 12 ");
        assert_eq!(env_or("ORBITWATCH_TEST_GARBAGE", 7u32), 12);
        std::env::remove_var("ORBITWATCH_TEST_GARBAGE");
    }
}
