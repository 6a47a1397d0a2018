//! Stats module - aggregation queries and summary statistics

mod calculator;

pub use calculator::{DetailedStats, GroupMean, QueryEngine, QueryError, QueryResult};
