//! Statistics Calculator Module
//! Read-only aggregation queries over the persisted products relation.

use polars::prelude::*;
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::data::{ProductStore, StoreError};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Outcome of a query: either data, or a normal "nothing matched" signal.
/// An empty match is not an error and callers must handle both branches.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    Found(T),
    NoData { subject: String },
}

/// Mean protein for one group in a grouped query.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub group: String,
    pub mean_protein: f64,
}

/// Summary statistics for one category.
///
/// `std_dev` is the population standard deviation (sum of squared
/// deviations divided by count, not count - 1).
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// Executes the three aggregation queries. Never mutates the relation.
pub struct QueryEngine {
    store: ProductStore,
}

impl QueryEngine {
    pub fn new(store: ProductStore) -> Self {
        Self { store }
    }

    /// Mean protein per category for one country, highest mean first.
    pub fn mean_protein_by_country(
        &self,
        country: &str,
    ) -> Result<QueryResult<Vec<GroupMean>>, QueryError> {
        let df = self
            .store
            .select_where("country", country, &["category", "protein"])?;
        if df.height() == 0 {
            return Ok(QueryResult::NoData {
                subject: country.to_string(),
            });
        }
        Ok(QueryResult::Found(Self::grouped_means(&df, "category")?))
    }

    /// Mean protein per country for one category, highest mean first.
    pub fn mean_protein_by_category(
        &self,
        category: &str,
    ) -> Result<QueryResult<Vec<GroupMean>>, QueryError> {
        let df = self
            .store
            .select_where("category", category, &["country", "protein"])?;
        if df.height() == 0 {
            return Ok(QueryResult::NoData {
                subject: category.to_string(),
            });
        }
        Ok(QueryResult::Found(Self::grouped_means(&df, "country")?))
    }

    /// Count, mean, median and population standard deviation of protein
    /// for one category.
    pub fn detailed_stats(&self, category: &str) -> Result<QueryResult<DetailedStats>, QueryError> {
        let df = self.store.select_where("category", category, &["protein"])?;
        let values = Self::column_values(&df, "protein")?;
        if values.is_empty() {
            return Ok(QueryResult::NoData {
                subject: category.to_string(),
            });
        }

        let count = values.len();
        let mean = values.iter().mean();
        let std_dev = values.iter().population_std_dev();
        let median = Data::new(values).median();

        Ok(QueryResult::Found(DetailedStats {
            count,
            mean,
            median,
            std_dev,
        }))
    }

    /// Group `df` by the given key column and average protein per group,
    /// sorted by descending mean. Groups accumulate in a BTreeMap, so equal
    /// means come out in alphabetical order.
    fn grouped_means(df: &DataFrame, key: &str) -> Result<Vec<GroupMean>, QueryError> {
        let keys = df.column(key)?;
        let keys = keys.str()?;
        let proteins = df.column("protein")?;
        let proteins = proteins.f64()?;

        let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for i in 0..df.height() {
            if let (Some(k), Some(v)) = (keys.get(i), proteins.get(i)) {
                groups.entry(k.to_string()).or_default().push(v);
            }
        }

        let mut means: Vec<GroupMean> = groups
            .into_iter()
            .map(|(group, values)| GroupMean {
                mean_protein: values.iter().mean(),
                group,
            })
            .collect();
        means.sort_by(|a, b| {
            b.mean_protein
                .partial_cmp(&a.mean_protein)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(means)
    }

    /// Pull one f64 column out of a frame, skipping nulls.
    fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, QueryError> {
        let col = df.column(name)?;
        let ca = col.f64()?;
        Ok(ca.into_iter().flatten().collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::data::ProductCleaner;
    use std::io::Write;
    use tempfile::TempDir;

    fn engine_with(dir: &TempDir, rows: &[(&str, &str, &str, f64)]) -> QueryEngine {
        let df = DataFrame::new(vec![
            Column::new(
                "product_name".into(),
                rows.iter().map(|r| r.0.to_string()).collect::<Vec<_>>(),
            ),
            Column::new(
                "country".into(),
                rows.iter().map(|r| r.1.to_string()).collect::<Vec<_>>(),
            ),
            Column::new(
                "category".into(),
                rows.iter().map(|r| r.2.to_string()).collect::<Vec<_>>(),
            ),
            Column::new(
                "protein".into(),
                rows.iter().map(|r| r.3).collect::<Vec<_>>(),
            ),
        ])
        .unwrap();

        let store = ProductStore::new(dir.path().join("food.parquet"));
        store.replace(df).unwrap();
        QueryEngine::new(store)
    }

    // ── no-data signals ───────────────────────────────────────────────────────

    #[test]
    fn test_by_country_empty_match_is_no_data_signal() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(&dir, &[("A", "France", "Meats", 10.0)]);

        let result = engine.mean_protein_by_country("Italy").unwrap();
        assert_eq!(
            result,
            QueryResult::NoData {
                subject: "Italy".to_string()
            }
        );
    }

    #[test]
    fn test_by_category_empty_match_is_no_data_signal() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(&dir, &[("A", "France", "Meats", 10.0)]);

        let result = engine.mean_protein_by_category("Cheeses").unwrap();
        assert!(matches!(result, QueryResult::NoData { ref subject } if subject == "Cheeses"));
    }

    #[test]
    fn test_detailed_stats_empty_match_is_no_data_signal() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(&dir, &[("A", "France", "Meats", 10.0)]);

        let result = engine.detailed_stats("Cheeses").unwrap();
        assert!(matches!(result, QueryResult::NoData { .. }));
    }

    // ── grouped means ─────────────────────────────────────────────────────────

    #[test]
    fn test_by_country_groups_and_sorts_descending() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(
            &dir,
            &[
                ("A", "France", "Snacks", 2.0),
                ("B", "France", "Meats", 18.0),
                ("C", "France", "Meats", 22.0),
                ("D", "France", "Breads", 9.0),
                ("E", "Germany", "Meats", 50.0), // other country, excluded
            ],
        );

        let QueryResult::Found(means) = engine.mean_protein_by_country("France").unwrap() else {
            panic!("expected data");
        };
        assert_eq!(means.len(), 3);
        assert_eq!(means[0].group, "Meats");
        assert!((means[0].mean_protein - 20.0).abs() < 1e-9);
        assert_eq!(means[1].group, "Breads");
        assert_eq!(means[2].group, "Snacks");
        for pair in means.windows(2) {
            assert!(pair[0].mean_protein >= pair[1].mean_protein);
        }
    }

    #[test]
    fn test_by_category_groups_by_country() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(
            &dir,
            &[
                ("A", "France", "Meats", 20.0),
                ("B", "Germany", "Meats", 10.0),
                ("C", "France", "Snacks", 2.0),
            ],
        );

        let QueryResult::Found(means) = engine.mean_protein_by_category("Meats").unwrap() else {
            panic!("expected data");
        };
        assert_eq!(
            means,
            vec![
                GroupMean {
                    group: "France".to_string(),
                    mean_protein: 20.0
                },
                GroupMean {
                    group: "Germany".to_string(),
                    mean_protein: 10.0
                },
            ]
        );
    }

    #[test]
    fn test_match_is_case_sensitive_as_stored() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(&dir, &[("A", "France", "Meats", 10.0)]);

        let result = engine.mean_protein_by_country("france").unwrap();
        assert!(matches!(result, QueryResult::NoData { .. }));
    }

    // ── detailed stats ────────────────────────────────────────────────────────

    #[test]
    fn test_detailed_stats_uses_population_std_dev() {
        let dir = TempDir::new().unwrap();
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let rows: Vec<(&str, &str, &str, f64)> = values
            .iter()
            .map(|&v| ("A", "France", "Meats", v))
            .collect();
        let engine = engine_with(&dir, &rows);

        let QueryResult::Found(stats) = engine.detailed_stats("Meats").unwrap() else {
            panic!("expected data");
        };
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-9);
        // Population formula gives exactly 2.0; the sample formula would
        // give ~2.138.
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
        assert!((stats.median - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_detailed_stats_count_matches_filter() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(
            &dir,
            &[
                ("A", "France", "Meats", 10.0),
                ("B", "Spain", "Meats", 12.0),
                ("C", "France", "Snacks", 2.0),
            ],
        );

        let QueryResult::Found(stats) = engine.detailed_stats("Meats").unwrap() else {
            panic!("expected data");
        };
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_detailed_stats_odd_count_median() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(
            &dir,
            &[
                ("A", "France", "Meats", 1.0),
                ("B", "France", "Meats", 9.0),
                ("C", "France", "Meats", 3.0),
            ],
        );

        let QueryResult::Found(stats) = engine.detailed_stats("Meats").unwrap() else {
            panic!("expected data");
        };
        assert!((stats.median - 3.0).abs() < 1e-9);
    }

    // ── end to end ────────────────────────────────────────────────────────────

    #[test]
    fn test_clean_persist_query_pipeline() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("dump.tsv");
        let mut file = std::fs::File::create(&source).unwrap();
        writeln!(file, "code\tproduct_name\tcountries_en\tcategories\tproteins_100g").unwrap();
        writeln!(file, "1\tA\tFrance, Spain\tMeats, Red Meat\t20").unwrap();
        writeln!(file, "2\tB\tGermany\tMeats\t10").unwrap();
        writeln!(file, "3\tC\tFrance\tSnacks\t2").unwrap();

        let store = ProductStore::new(dir.path().join("food.parquet"));
        let kept = ProductCleaner::run(&AnalyzerConfig::new(&source), &store).unwrap();
        assert_eq!(kept, 3);

        // Round trip: everything that passed cleaning is queryable, nothing
        // lost or duplicated.
        let all = store.read_all().unwrap();
        assert_eq!(all.height(), 3);
        let countries = all.column("country").unwrap();
        let countries = countries.str().unwrap();
        let got: Vec<&str> = (0..3).map(|i| countries.get(i).unwrap()).collect();
        assert_eq!(got, ["France", "Germany", "France"]);

        let engine = QueryEngine::new(store);

        let QueryResult::Found(by_country) = engine.mean_protein_by_country("France").unwrap()
        else {
            panic!("expected data");
        };
        assert_eq!(by_country.len(), 2);
        assert_eq!(by_country[0].group, "Meats");
        assert!((by_country[0].mean_protein - 20.0).abs() < 1e-9);
        assert_eq!(by_country[1].group, "Snacks");
        assert!((by_country[1].mean_protein - 2.0).abs() < 1e-9);

        let QueryResult::Found(by_category) = engine.mean_protein_by_category("Meats").unwrap()
        else {
            panic!("expected data");
        };
        assert_eq!(by_category[0].group, "France");
        assert!((by_category[0].mean_protein - 20.0).abs() < 1e-9);
        assert_eq!(by_category[1].group, "Germany");
        assert!((by_category[1].mean_protein - 10.0).abs() < 1e-9);
    }
}
