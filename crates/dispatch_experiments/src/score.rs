//! Weighted service score for ranking sweep results.
//!
//! Each metric is min-max normalised across the result set, so scores are
//! only comparable within one sweep.

use crate::metrics::SweepResult;

/// Default weights:
///
/// - Delivery time: 0.4 (lower is better)
/// - Driver utilisation: 0.3
/// - Delivery margin: 0.3
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub delivery_time_weight: f64,
    pub utilisation_weight: f64,
    pub margin_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            delivery_time_weight: 0.4,
            utilisation_weight: 0.3,
            margin_weight: 0.3,
        }
    }
}

/// `(value - min) / (max - min)` clamped to [0, 1]; 0.5 when all values are equal.
fn normalize_metric(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        0.5
    } else {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    }
}

fn bounds(results: &[SweepResult], metric: impl Fn(&SweepResult) -> f64) -> (f64, f64) {
    results
        .iter()
        .map(metric)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        })
}

/// Scores in input order. Higher is better.
pub fn calculate_scores(results: &[SweepResult], weights: &ScoreWeights) -> Vec<f64> {
    if results.is_empty() {
        return Vec::new();
    }
    let (time_min, time_max) = bounds(results, |r| r.avg_delivery_minutes);
    let (util_min, util_max) = bounds(results, |r| r.driver_utilisation);
    let (margin_min, margin_max) = bounds(results, |r| r.delivery_margin);

    results
        .iter()
        .map(|r| {
            let time = 1.0 - normalize_metric(r.avg_delivery_minutes, time_min, time_max);
            let util = normalize_metric(r.driver_utilisation, util_min, util_max);
            let margin = normalize_metric(r.delivery_margin, margin_min, margin_max);
            weights.delivery_time_weight * time
                + weights.utilisation_weight * util
                + weights.margin_weight * margin
        })
        .collect()
}

/// Index of the highest-scoring result; the first wins ties.
pub fn find_best_result_index(results: &[SweepResult], weights: &ScoreWeights) -> Option<usize> {
    calculate_scores(results, weights)
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((i, score)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::scenario::RoutingStrategy;

    fn result(run_id: usize, minutes: f64, utilisation: f64, margin: f64) -> SweepResult {
        SweepResult {
            experiment_id: "t".into(),
            run_id,
            seed: 1,
            order_count: 10,
            driver_count: 2,
            clustering_radius_km: 2.0,
            routing_strategy: RoutingStrategy::NearestNeighbor,
            delivered: 10,
            batches: 4,
            avg_orders_per_batch: 2.5,
            sampling_fallbacks: 0,
            avg_delivery_minutes: minutes,
            median_delivery_minutes: minutes,
            p90_delivery_minutes: minutes,
            makespan_minutes: 100.0,
            driver_utilisation: utilisation,
            total_route_km: 20.0,
            total_order_value: 280.0,
            driver_pay: 30.0,
            delivery_margin: margin,
        }
    }

    #[test]
    fn empty_results_have_no_best() {
        assert!(calculate_scores(&[], &ScoreWeights::default()).is_empty());
        assert_eq!(find_best_result_index(&[], &ScoreWeights::default()), None);
    }

    #[test]
    fn identical_results_score_the_midpoint() {
        let results = vec![result(0, 30.0, 0.5, 10.0), result(1, 30.0, 0.5, 10.0)];
        let scores = calculate_scores(&results, &ScoreWeights::default());
        assert!(scores.iter().all(|s| (s - 0.5).abs() < 1e-12));
        assert_eq!(find_best_result_index(&results, &ScoreWeights::default()), Some(0));
    }

    #[test]
    fn faster_cheaper_busier_run_wins() {
        let results = vec![
            result(0, 45.0, 0.4, 5.0),
            result(1, 30.0, 0.7, 12.0),
            result(2, 38.0, 0.5, 8.0),
        ];
        let scores = calculate_scores(&results, &ScoreWeights::default());
        assert!((scores[1] - 1.0).abs() < 1e-12);
        assert!(scores[0].abs() < 1e-12);
        assert_eq!(find_best_result_index(&results, &ScoreWeights::default()), Some(1));
    }

    #[test]
    fn weights_change_the_ranking() {
        let results = vec![result(0, 30.0, 0.4, 5.0), result(1, 45.0, 0.4, 12.0)];
        let time_only = ScoreWeights {
            delivery_time_weight: 1.0,
            utilisation_weight: 0.0,
            margin_weight: 0.0,
        };
        let margin_only = ScoreWeights {
            delivery_time_weight: 0.0,
            utilisation_weight: 0.0,
            margin_weight: 1.0,
        };
        assert_eq!(find_best_result_index(&results, &time_only), Some(0));
        assert_eq!(find_best_result_index(&results, &margin_only), Some(1));
    }
}
