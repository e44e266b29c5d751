//! Per-run metrics extracted from a [`RunReport`].

use dispatch_core::report::RunReport;
use dispatch_core::scenario::RoutingStrategy;
use serde::Serialize;

use crate::parameters::ParameterSet;

/// Aggregated outcome of one sweep run, with the swept parameters inlined so
/// rows stand on their own when exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub experiment_id: String,
    pub run_id: usize,
    pub seed: u64,
    pub order_count: usize,
    pub driver_count: usize,
    pub clustering_radius_km: f64,
    pub routing_strategy: RoutingStrategy,

    pub delivered: usize,
    pub batches: usize,
    pub avg_orders_per_batch: f64,
    pub sampling_fallbacks: usize,
    /// Minutes from order creation to drop-off.
    pub avg_delivery_minutes: f64,
    pub median_delivery_minutes: f64,
    pub p90_delivery_minutes: f64,
    /// Last driver release time.
    pub makespan_minutes: f64,
    /// Share of driver-minutes spent on routes over the makespan.
    pub driver_utilisation: f64,
    pub total_route_km: f64,
    pub total_order_value: f64,
    pub driver_pay: f64,
    pub delivery_margin: f64,
}

/// Mean, median and 90th percentile. All zero for an empty slice.
pub fn calculate_stats(values: &[f64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let avg = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p90 = sorted[((n - 1) as f64 * 0.9) as usize];
    (avg, median, p90)
}

pub fn extract_metrics(set: &ParameterSet, report: &RunReport) -> SweepResult {
    let totals = &report.totals;
    let delivery_minutes: Vec<f64> = report
        .orders
        .iter()
        .filter_map(|order| order.delivered_at.map(|at| at - order.created_at))
        .collect();
    let (avg, median, p90) = calculate_stats(&delivery_minutes);

    let busy_minutes: f64 = report
        .batches
        .iter()
        .filter_map(|batch| Some(batch.finish_at? - batch.depart_at?))
        .sum();
    let capacity = totals.drivers as f64 * totals.makespan_minutes;
    let driver_utilisation = if capacity > 0.0 {
        busy_minutes / capacity
    } else {
        0.0
    };

    SweepResult {
        experiment_id: set.experiment_id.clone(),
        run_id: set.run_id,
        seed: set.params.seed,
        order_count: set.params.order_count,
        driver_count: set.params.driver_count,
        clustering_radius_km: set.params.clustering_radius_km,
        routing_strategy: set.params.routing_strategy,
        delivered: totals.delivered,
        batches: totals.batches,
        avg_orders_per_batch: if totals.batches > 0 {
            totals.orders as f64 / totals.batches as f64
        } else {
            0.0
        },
        sampling_fallbacks: totals.sampling_fallbacks,
        avg_delivery_minutes: avg,
        median_delivery_minutes: median,
        p90_delivery_minutes: p90,
        makespan_minutes: totals.makespan_minutes,
        driver_utilisation,
        total_route_km: totals.economics.route_km,
        total_order_value: totals.economics.total_value,
        driver_pay: totals.economics.driver_pay,
        delivery_margin: totals.economics.delivery_margin,
    }
}
