//! Data module - raw dump cleaning and the persisted products relation

mod loader;
mod store;

pub use loader::{canonical_value, title_case, LoaderError, ProductCleaner, REQUIRED_COLUMNS};
pub use store::{ProductStore, StoreError};
