//! Domain types shared by every crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Classification tag attached to every catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Satellite,
    Debris,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Satellite => "satellite",
            Category::Debris => "debris",
        }
    }

    /// Capitalized form used in human-readable descriptions.
    pub fn label(self) -> &'static str {
        match self {
            Category::Satellite => "Satellite",
            Category::Debris => "Debris",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "satellite" => Ok(Category::Satellite),
            "debris" => Ok(Category::Debris),
            other => Err(Error::Parse(format!("unknown category: {}", other))),
        }
    }
}

/// The two fixed-format element lines of one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementPair {
    pub line1: String,
    pub line2: String,
}

impl ElementPair {
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        Self {
            line1: line1.into(),
            line2: line2.into(),
        }
    }

    /// Catalog number from columns 3-7 of line 1, trimmed.
    pub fn catalog_number(&self) -> Option<&str> {
        self.line1
            .get(2..7)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
