use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array, UInt64Array};
use arrow::datatypes::Schema;

use crate::telemetry::SimTelemetry;

use super::utils::{f64_field, u32_field, u64_field, write_record_batch};

/// One row per settled batch with its economics.
pub fn write_completed_batches_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &SimTelemetry,
) -> Result<(), Box<dyn Error>> {
    let rows = &telemetry.completed_batches;
    let mut batch_id = Vec::with_capacity(rows.len());
    let mut driver_id = Vec::with_capacity(rows.len());
    let mut order_count = Vec::with_capacity(rows.len());
    let mut depart_at = Vec::with_capacity(rows.len());
    let mut finish_at = Vec::with_capacity(rows.len());
    let mut completed_at = Vec::with_capacity(rows.len());
    let mut total_value = Vec::with_capacity(rows.len());
    let mut route_km = Vec::with_capacity(rows.len());
    let mut driver_pay = Vec::with_capacity(rows.len());
    let mut delivery_margin = Vec::with_capacity(rows.len());

    for record in rows {
        batch_id.push(record.batch_id.0);
        driver_id.push(record.driver_id.0);
        order_count.push(record.economics.order_count as u64);
        depart_at.push(record.depart_at);
        finish_at.push(record.finish_at);
        completed_at.push(record.completed_at);
        total_value.push(record.economics.total_value);
        route_km.push(record.economics.route_km);
        driver_pay.push(record.economics.driver_pay);
        delivery_margin.push(record.economics.delivery_margin);
    }

    let schema = Schema::new(vec![
        u32_field("batch_id"),
        u32_field("driver_id"),
        u64_field("order_count"),
        f64_field("depart_at"),
        f64_field("finish_at"),
        f64_field("completed_at"),
        f64_field("total_value"),
        f64_field("route_km"),
        f64_field("driver_pay"),
        f64_field("delivery_margin"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(batch_id)),
        Arc::new(UInt32Array::from(driver_id)),
        Arc::new(UInt64Array::from(order_count)),
        Arc::new(Float64Array::from(depart_at)),
        Arc::new(Float64Array::from(finish_at)),
        Arc::new(Float64Array::from(completed_at)),
        Arc::new(Float64Array::from(total_value)),
        Arc::new(Float64Array::from(route_km)),
        Arc::new(Float64Array::from(driver_pay)),
        Arc::new(Float64Array::from(delivery_margin)),
    ];

    write_record_batch(path, schema, arrays)
}
