//! Name → category classification.

use orbitwatch_core::Category;

/// Uppercase name fragments that mark an active satellite.
pub const SATELLITE_KEYWORDS: [&str; 10] = [
    "ISS", "STARLINK", "COSMOS", "SPUTNIK", "IRIDIUM", "INTELSAT", "GOES", "GPS", "GALILEO",
    "GLONASS",
];

/// Keyword inference: `Satellite` if the uppercased name contains any
/// keyword, otherwise `Debris`.
pub fn classify_name(name: &str) -> Category {
    let upper = name.to_uppercase();
    if SATELLITE_KEYWORDS.iter().any(|k| upper.contains(k)) {
        Category::Satellite
    } else {
        Category::Debris
    }
}

/// How one ingest pass assigns categories. A pass uses exactly one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationPolicy {
    /// Every object takes the source group's category.
    Group(Category),
    /// Ungrouped input: fall back to [`classify_name`].
    Keyword,
}

impl ClassificationPolicy {
    pub fn for_group(category: Option<Category>) -> Self {
        category.map_or(Self::Keyword, Self::Group)
    }

    pub fn classify(&self, name: &str) -> Category {
        match self {
            Self::Group(category) => *category,
            Self::Keyword => classify_name(name),
        }
    }
}
