//! OrbitWatch Core — error taxonomy, configuration, shared domain types.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DataPaths, FetchPolicy, OrbitWatchConfig, SourceGroup, TrajectoryCadence};
pub use error::{Error, Result};
pub use types::{Category, ElementPair};
