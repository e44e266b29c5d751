//! Sweep result export to JSON, CSV and Parquet.

mod csv;
mod json;
mod parquet;
mod writer_utils;

use std::error::Error;
use std::path::Path;

use crate::metrics::SweepResult;

/// Pretty-printed JSON array of results. An empty sweep writes `[]`.
pub fn export_to_json(results: &[SweepResult], path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

/// One CSV row per result with a header row.
pub fn export_to_csv(results: &[SweepResult], path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(results, file)
}

pub fn export_to_parquet(
    results: &[SweepResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_to_parquet_impl(results, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterSpace;
    use crate::runner::{run_parallel_experiments, RunMode};
    use ::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use dispatch_core::test_helpers::example_params;

    fn results() -> Vec<SweepResult> {
        let sets = ParameterSpace::new(example_params())
            .driver_counts(vec![2, 3])
            .generate();
        run_parallel_experiments(&sets, RunMode::Projected, Some(1), false).expect("sweep")
    }

    #[test]
    fn json_round_trips_the_row_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.json");
        export_to_json(&results(), &path).expect("json");
        let text = std::fs::read_to_string(&path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("parse");
        let rows = value.as_array().expect("array");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["driverCount"], 2);
    }

    #[test]
    fn csv_has_header_and_one_row_per_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.csv");
        export_to_csv(&results(), &path).expect("csv");
        let mut reader = ::csv::Reader::from_path(&path).expect("reader");
        let headers = reader.headers().expect("headers").clone();
        assert_eq!(&headers[0], "experiment_id");
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn parquet_has_one_row_per_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.parquet");
        export_to_parquet(&results(), &path).expect("parquet");
        let file = std::fs::File::open(&path).expect("open");
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .expect("builder")
            .build()
            .expect("reader");
        let rows: usize = reader.map(|batch| batch.expect("batch").num_rows()).sum();
        assert_eq!(rows, 2);
    }

    #[test]
    fn empty_results_are_rejected_for_tabular_formats() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(export_to_csv(&[], dir.path().join("a.csv")).is_err());
        assert!(export_to_parquet(&[], dir.path().join("a.parquet")).is_err());
        assert!(export_to_json(&[], dir.path().join("a.json")).is_ok());
    }
}
