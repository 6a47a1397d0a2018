//! Loader configuration: source path plus the country/category allow-lists.

use std::path::PathBuf;

/// Countries kept after normalization. Anything else is filtered out.
pub const TARGET_COUNTRIES: [&str; 5] = [
    "France",
    "United States",
    "Germany",
    "Spain",
    "United Kingdom",
];

/// Categories kept after normalization.
pub const TARGET_CATEGORIES: [&str; 7] = [
    "Beverages",
    "Meats",
    "Snacks",
    "Breads",
    "Desserts",
    "Pizzas",
    "Fruits",
];

/// Configuration for one cleaning run.
///
/// The allow-lists default to the process-wide constants but are carried
/// explicitly so tests can substitute their own.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Path to the raw tab-separated product dump.
    pub source_path: PathBuf,
    pub target_countries: Vec<String>,
    pub target_categories: Vec<String>,
}

impl AnalyzerConfig {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            target_countries: TARGET_COUNTRIES.iter().map(|s| s.to_string()).collect(),
            target_categories: TARGET_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
