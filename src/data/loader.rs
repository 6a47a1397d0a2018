//! Raw Dataset Cleaner Module
//! Reads the messy Open Food Facts TSV dump and produces the clean
//! `products` relation using Polars.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

use crate::config::AnalyzerConfig;
use crate::data::store::{ProductStore, StoreError};

/// The raw columns the cleaner materializes; anything else in the dump is
/// never read.
pub const REQUIRED_COLUMNS: [&str; 4] =
    ["product_name", "countries_en", "categories", "proteins_100g"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load TSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Raw source is missing required column '{0}'")]
    MissingColumn(String),
    #[error("Failed to persist products: {0}")]
    StoreError(#[from] StoreError),
}

/// Title-case a string the way the menu and the cleaner both need it:
/// the first letter after any non-alphabetic character is uppercased,
/// the rest lowercased. `"united kingdom"` -> `"United Kingdom"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Reduce a messy multi-valued cell to its canonical single value:
/// first comma-separated segment, trimmed, title-cased.
/// `"france, germany, uk"` -> `"France"`.
pub fn canonical_value(cell: &str) -> String {
    let first = cell.split(',').next().unwrap_or("").trim();
    title_case(first)
}

/// Transforms one raw wide tabular dump into the canonical products relation.
pub struct ProductCleaner;

impl ProductCleaner {
    /// Load the raw dump, materializing only the four required columns and
    /// renaming them for downstream uniformity.
    ///
    /// A missing required column is fatal; per-cell parse errors are
    /// tolerated as nulls and dropped during [`clean`](Self::clean).
    pub fn load_raw(path: &Path) -> Result<DataFrame, LoaderError> {
        let mut lf = LazyCsvReader::new(path)
            .with_separator(b'\t')
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?;

        let schema = lf.collect_schema()?;
        for name in REQUIRED_COLUMNS {
            if !schema.contains(name) {
                return Err(LoaderError::MissingColumn(name.to_string()));
            }
        }

        let df = lf
            .select([
                col("product_name"),
                col("countries_en").alias("country"),
                col("categories"),
                col("proteins_100g").alias("protein"),
            ])
            .collect()?;

        Ok(df)
    }

    /// Clean the renamed raw frame into the final relation.
    ///
    /// Drops rows missing any of the four fields, normalizes country and
    /// category to canonical single values, and keeps only rows whose
    /// normalized values are on the configured allow-lists. Duplicate rows
    /// are preserved.
    pub fn clean(df: &DataFrame, config: &AnalyzerConfig) -> Result<DataFrame, LoaderError> {
        let names = df.column("product_name")?.cast(&DataType::String)?;
        let names = names.str()?;
        let countries = df.column("country")?.cast(&DataType::String)?;
        let countries = countries.str()?;
        let categories = df.column("categories")?.cast(&DataType::String)?;
        let categories = categories.str()?;
        let proteins = df.column("protein")?.cast(&DataType::Float64)?;
        let proteins = proteins.f64()?;

        let mut out_names: Vec<String> = Vec::new();
        let mut out_countries: Vec<String> = Vec::new();
        let mut out_categories: Vec<String> = Vec::new();
        let mut out_proteins: Vec<f64> = Vec::new();

        for i in 0..df.height() {
            let (Some(name), Some(raw_country), Some(raw_category), Some(protein)) =
                (names.get(i), countries.get(i), categories.get(i), proteins.get(i))
            else {
                continue;
            };
            if protein.is_nan() {
                continue;
            }

            let country = canonical_value(raw_country);
            let category = canonical_value(raw_category);
            if !config.target_countries.iter().any(|c| c == &country) {
                continue;
            }
            if !config.target_categories.iter().any(|c| c == &category) {
                continue;
            }

            out_names.push(name.to_string());
            out_countries.push(country);
            out_categories.push(category);
            out_proteins.push(protein);
        }

        let df = DataFrame::new(vec![
            Column::new("product_name".into(), out_names),
            Column::new("country".into(), out_countries),
            Column::new("category".into(), out_categories),
            Column::new("protein".into(), out_proteins),
        ])?;

        Ok(df)
    }

    /// Run the full pipeline: read, clean, persist. Returns the number of
    /// rows in the rebuilt relation. The store is only touched once the
    /// whole transform has succeeded.
    pub fn run(config: &AnalyzerConfig, store: &ProductStore) -> Result<usize, LoaderError> {
        tracing::info!(source = %config.source_path.display(), "loading raw product dump");
        let raw = Self::load_raw(&config.source_path)?;
        tracing::info!(rows = raw.height(), "raw rows materialized");

        let cleaned = Self::clean(&raw, config)?;
        let kept = cleaned.height();
        tracing::info!(rows = kept, "rows surviving cleaning");

        store.replace(cleaned)?;
        Ok(kept)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
