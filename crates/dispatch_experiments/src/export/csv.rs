use std::error::Error;
use std::fs::File;

use crate::metrics::SweepResult;

use super::writer_utils::routing_label;

const HEADER: [&str; 22] = [
    "experiment_id",
    "run_id",
    "seed",
    "order_count",
    "driver_count",
    "clustering_radius_km",
    "routing_strategy",
    "delivered",
    "batches",
    "avg_orders_per_batch",
    "sampling_fallbacks",
    "avg_delivery_minutes",
    "median_delivery_minutes",
    "p90_delivery_minutes",
    "makespan_minutes",
    "driver_utilisation",
    "total_route_km",
    "total_order_value",
    "driver_pay",
    "delivery_margin",
    "margin_per_order",
    "km_per_order",
];

pub(crate) fn export_to_csv_impl(results: &[SweepResult], file: File) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(HEADER)?;

    for r in results {
        let per_order = |value: f64| {
            if r.delivered > 0 {
                value / r.delivered as f64
            } else {
                0.0
            }
        };
        wtr.write_record([
            r.experiment_id.clone(),
            r.run_id.to_string(),
            r.seed.to_string(),
            r.order_count.to_string(),
            r.driver_count.to_string(),
            r.clustering_radius_km.to_string(),
            routing_label(r.routing_strategy).to_string(),
            r.delivered.to_string(),
            r.batches.to_string(),
            r.avg_orders_per_batch.to_string(),
            r.sampling_fallbacks.to_string(),
            r.avg_delivery_minutes.to_string(),
            r.median_delivery_minutes.to_string(),
            r.p90_delivery_minutes.to_string(),
            r.makespan_minutes.to_string(),
            r.driver_utilisation.to_string(),
            r.total_route_km.to_string(),
            r.total_order_value.to_string(),
            r.driver_pay.to_string(),
            r.delivery_margin.to_string(),
            per_order(r.delivery_margin).to_string(),
            per_order(r.total_route_km).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
