//! OrbitWatch Ingest — element-set parsing, structural validation, classification.

pub mod classify;
pub mod parse;

pub use classify::{classify_name, ClassificationPolicy, SATELLITE_KEYWORDS};
pub use parse::{element_checksum, CandidateRecord, ElementSetParser, ParseRejection};
