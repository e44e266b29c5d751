use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, UInt32Array, UInt8Array};
use arrow::datatypes::Schema;

use crate::report::OrderView;

use super::utils::{
    bool_field, f64_field, nullable_f64_field, nullable_u32_field, order_status_code, u32_field,
    u8_field, write_record_batch,
};

pub fn write_orders_parquet<P: AsRef<Path>>(
    path: P,
    orders: &[OrderView],
) -> Result<(), Box<dyn Error>> {
    let schema = Schema::new(vec![
        u32_field("order_id"),
        u32_field("hub_id"),
        u8_field("status"),
        f64_field("customer_lat"),
        f64_field("customer_lng"),
        f64_field("created_at"),
        f64_field("value"),
        f64_field("distance_from_hub_km"),
        bool_field("fallback"),
        nullable_u32_field("batch_id"),
        nullable_u32_field("driver_id"),
        nullable_f64_field("eta"),
        nullable_f64_field("delivered_at"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from_iter_values(orders.iter().map(|o| o.id.0))),
        Arc::new(UInt32Array::from_iter_values(orders.iter().map(|o| o.hub_id.0))),
        Arc::new(UInt8Array::from_iter_values(
            orders.iter().map(|o| order_status_code(o.status)),
        )),
        Arc::new(Float64Array::from_iter_values(orders.iter().map(|o| o.customer.lat))),
        Arc::new(Float64Array::from_iter_values(orders.iter().map(|o| o.customer.lng))),
        Arc::new(Float64Array::from_iter_values(orders.iter().map(|o| o.created_at))),
        Arc::new(Float64Array::from_iter_values(orders.iter().map(|o| o.value))),
        Arc::new(Float64Array::from_iter_values(
            orders.iter().map(|o| o.distance_from_hub_km),
        )),
        Arc::new(BooleanArray::from(
            orders.iter().map(|o| o.fallback).collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            orders.iter().map(|o| o.batch_id.map(|b| b.0)).collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            orders.iter().map(|o| o.driver_id.map(|d| d.0)).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(orders.iter().map(|o| o.eta).collect::<Vec<_>>())),
        Arc::new(Float64Array::from(
            orders.iter().map(|o| o.delivered_at).collect::<Vec<_>>(),
        )),
    ];

    write_record_batch(path, schema, arrays)
}
