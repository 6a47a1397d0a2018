//! Products Store Module
//! The persisted `products` relation, kept as a single Parquet file that is
//! rebuilt wholesale by the cleaner and only ever read by the query layer.

use polars::prelude::*;
use std::fs::File;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Store query error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Handle on the products relation. Holds only the path; every operation
/// opens and releases the file within its own call.
#[derive(Debug, Clone)]
pub struct ProductStore {
    path: PathBuf,
}

impl ProductStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destructively replace the relation with `df`.
    ///
    /// Writes to a sibling temp file and renames it into place, so an
    /// interrupted write never leaves a half-written relation behind.
    pub fn replace(&self, mut df: DataFrame) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("parquet.tmp");
        let file = File::create(&tmp)?;
        ParquetWriter::new(file).finish(&mut df)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::info!(rows = df.height(), path = %self.path.display(), "products relation replaced");
        Ok(())
    }

    /// One read-only session: scan the relation, keep rows where
    /// `filter_col == value`, project `wanted`, and collect.
    pub fn select_where(
        &self,
        filter_col: &str,
        value: &str,
        wanted: &[&str],
    ) -> Result<DataFrame, StoreError> {
        let projection: Vec<Expr> = wanted.iter().map(|c| col(*c)).collect();
        let df = LazyFrame::scan_parquet(&self.path, ScanArgsParquet::default())?
            .filter(col(filter_col).eq(lit(value)))
            .select(projection)
            .collect()?;
        Ok(df)
    }

    /// Read the whole relation back. Used by tests and diagnostics.
    pub fn read_all(&self) -> Result<DataFrame, StoreError> {
        let df = LazyFrame::scan_parquet(&self.path, ScanArgsParquet::default())?.collect()?;
        Ok(df)
    }
}
