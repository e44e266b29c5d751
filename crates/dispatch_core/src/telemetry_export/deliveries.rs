use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array};
use arrow::datatypes::Schema;

use crate::telemetry::SimTelemetry;

use super::utils::{f64_field, u32_field, write_record_batch};

pub fn write_deliveries_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &SimTelemetry,
) -> Result<(), Box<dyn Error>> {
    let rows = &telemetry.deliveries;
    let mut order_id = Vec::with_capacity(rows.len());
    let mut batch_id = Vec::with_capacity(rows.len());
    let mut driver_id = Vec::with_capacity(rows.len());
    let mut created_at = Vec::with_capacity(rows.len());
    let mut ready_at = Vec::with_capacity(rows.len());
    let mut picked_up_at = Vec::with_capacity(rows.len());
    let mut delivered_at = Vec::with_capacity(rows.len());
    let mut eta = Vec::with_capacity(rows.len());

    for record in rows {
        order_id.push(record.order_id.0);
        batch_id.push(record.batch_id.0);
        driver_id.push(record.driver_id.0);
        created_at.push(record.created_at);
        ready_at.push(record.ready_at);
        picked_up_at.push(record.picked_up_at);
        delivered_at.push(record.delivered_at);
        eta.push(record.eta);
    }

    let schema = Schema::new(vec![
        u32_field("order_id"),
        u32_field("batch_id"),
        u32_field("driver_id"),
        f64_field("created_at"),
        f64_field("ready_at"),
        f64_field("picked_up_at"),
        f64_field("delivered_at"),
        f64_field("eta"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(order_id)),
        Arc::new(UInt32Array::from(batch_id)),
        Arc::new(UInt32Array::from(driver_id)),
        Arc::new(Float64Array::from(created_at)),
        Arc::new(Float64Array::from(ready_at)),
        Arc::new(Float64Array::from(picked_up_at)),
        Arc::new(Float64Array::from(delivered_at)),
        Arc::new(Float64Array::from(eta)),
    ];

    write_record_batch(path, schema, arrays)
}
