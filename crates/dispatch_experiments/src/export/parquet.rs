use std::error::Error;
use std::fs::File;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::metrics::SweepResult;

use super::writer_utils::routing_label;

pub(crate) fn export_to_parquet_impl(results: &[SweepResult], file: File) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(parquet_schema());
    let batch = RecordBatch::try_new(schema.clone(), build_arrays(results))?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn parquet_schema() -> Schema {
    let u64_col = |name: &str| Field::new(name, DataType::UInt64, false);
    let f64_col = |name: &str| Field::new(name, DataType::Float64, false);
    Schema::new(vec![
        Field::new("experiment_id", DataType::Utf8, false),
        u64_col("run_id"),
        u64_col("seed"),
        u64_col("order_count"),
        u64_col("driver_count"),
        f64_col("clustering_radius_km"),
        Field::new("routing_strategy", DataType::Utf8, false),
        u64_col("delivered"),
        u64_col("batches"),
        f64_col("avg_orders_per_batch"),
        u64_col("sampling_fallbacks"),
        f64_col("avg_delivery_minutes"),
        f64_col("median_delivery_minutes"),
        f64_col("p90_delivery_minutes"),
        f64_col("makespan_minutes"),
        f64_col("driver_utilisation"),
        f64_col("total_route_km"),
        f64_col("total_order_value"),
        f64_col("driver_pay"),
        f64_col("delivery_margin"),
    ])
}

fn build_arrays(results: &[SweepResult]) -> Vec<ArrayRef> {
    let u64s = |f: fn(&SweepResult) -> u64| -> ArrayRef {
        Arc::new(UInt64Array::from_iter_values(results.iter().map(f)))
    };
    let f64s = |f: fn(&SweepResult) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(results.iter().map(f)))
    };
    vec![
        Arc::new(StringArray::from_iter_values(
            results.iter().map(|r| r.experiment_id.as_str()),
        )),
        u64s(|r| r.run_id as u64),
        u64s(|r| r.seed),
        u64s(|r| r.order_count as u64),
        u64s(|r| r.driver_count as u64),
        f64s(|r| r.clustering_radius_km),
        Arc::new(StringArray::from_iter_values(
            results.iter().map(|r| routing_label(r.routing_strategy)),
        )),
        u64s(|r| r.delivered as u64),
        u64s(|r| r.batches as u64),
        f64s(|r| r.avg_orders_per_batch),
        u64s(|r| r.sampling_fallbacks as u64),
        f64s(|r| r.avg_delivery_minutes),
        f64s(|r| r.median_delivery_minutes),
        f64s(|r| r.p90_delivery_minutes),
        f64s(|r| r.makespan_minutes),
        f64s(|r| r.driver_utilisation),
        f64s(|r| r.total_route_km),
        f64s(|r| r.total_order_value),
        f64s(|r| r.driver_pay),
        f64s(|r| r.delivery_margin),
    ]
}
