//! Settlement economics for completed batches.
//!
//! Order value is split into chef, platform and delivery shares by fixed
//! ratios. Driver pay is `base_fee_per_batch * order_count + per_km_rate *
//! route_km`; the delivery margin is the delivery share minus driver pay and
//! is reported as-is, negative values included.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::{BatchId, DriverId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub chef: f64,
    pub platform: f64,
    pub delivery: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            chef: 0.75,
            platform: 0.10,
            delivery: 0.15,
        }
    }
}

impl SplitRatios {
    pub fn sum(&self) -> f64 {
        self.chef + self.platform + self.delivery
    }

    /// Each ratio in [0, 1] and the sum within `tolerance` of 1.0.
    pub fn is_valid(&self, tolerance: f64) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.chef)
            && unit.contains(&self.platform)
            && unit.contains(&self.delivery)
            && (self.sum() - 1.0).abs() <= tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Resource)]
pub struct PricingConfig {
    pub split: SplitRatios,
    pub base_fee_per_batch: f64,
    pub per_km_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            split: SplitRatios::default(),
            base_fee_per_batch: 2.5,
            per_km_rate: 0.6,
        }
    }
}

impl PricingConfig {
    pub fn driver_pay(&self, order_count: usize, route_km: f64) -> f64 {
        self.base_fee_per_batch * order_count as f64 + self.per_km_rate * route_km
    }
}

/// Settlement of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEconomics {
    pub batch_id: BatchId,
    pub driver_id: DriverId,
    pub order_count: usize,
    pub total_value: f64,
    pub chef_share: f64,
    pub platform_share: f64,
    pub delivery_share: f64,
    /// Includes the approach leg from the driver's prior position.
    pub route_km: f64,
    pub driver_pay: f64,
    pub delivery_margin: f64,
}

pub fn settle_batch(
    config: &PricingConfig,
    batch_id: BatchId,
    driver_id: DriverId,
    order_values: &[f64],
    route_km: f64,
) -> BatchEconomics {
    let total_value: f64 = order_values.iter().sum();
    let delivery_share = total_value * config.split.delivery;
    let driver_pay = config.driver_pay(order_values.len(), route_km);
    BatchEconomics {
        batch_id,
        driver_id,
        order_count: order_values.len(),
        total_value,
        chef_share: total_value * config.split.chef,
        platform_share: total_value * config.split.platform,
        delivery_share,
        route_km,
        driver_pay,
        delivery_margin: delivery_share - driver_pay,
    }
}

/// Sums over settled batches. Each batch must be added exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicsSummary {
    pub batches: usize,
    pub orders: usize,
    pub total_value: f64,
    pub chef_share: f64,
    pub platform_share: f64,
    pub delivery_share: f64,
    pub route_km: f64,
    pub driver_pay: f64,
    pub delivery_margin: f64,
}

impl EconomicsSummary {
    pub fn add(&mut self, batch: &BatchEconomics) {
        self.batches += 1;
        self.orders += batch.order_count;
        self.total_value += batch.total_value;
        self.chef_share += batch.chef_share;
        self.platform_share += batch.platform_share;
        self.delivery_share += batch.delivery_share;
        self.route_km += batch.route_km;
        self.driver_pay += batch.driver_pay;
        self.delivery_margin += batch.delivery_margin;
    }

    pub fn from_batches<'a, I>(batches: I) -> Self
    where
        I: IntoIterator<Item = &'a BatchEconomics>,
    {
        let mut summary = Self::default();
        for batch in batches {
            summary.add(batch);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_conserve_total_value() {
        let economics = settle_batch(
            &PricingConfig::default(),
            BatchId(0),
            DriverId(0),
            &[19.99, 31.20, 27.05],
            8.4,
        );
        let shares = economics.chef_share + economics.platform_share + economics.delivery_share;
        assert!((shares - economics.total_value).abs() < 1e-6);
    }

    #[test]
    fn driver_pay_uses_order_count_and_route_km() {
        let config = PricingConfig::default();
        let economics = settle_batch(&config, BatchId(1), DriverId(2), &[20.0, 20.0], 10.0);
        assert!((economics.driver_pay - (2.5 * 2.0 + 0.6 * 10.0)).abs() < 1e-12);
    }

    #[test]
    fn negative_margin_is_not_clamped() {
        let economics = settle_batch(
            &PricingConfig::default(),
            BatchId(0),
            DriverId(0),
            &[10.0],
            40.0,
        );
        // delivery share 1.5, pay 2.5 + 24.0
        assert!((economics.delivery_margin - (1.5 - 26.5)).abs() < 1e-9);
    }

    #[test]
    fn summary_adds_each_batch_once() {
        let config = PricingConfig::default();
        let a = settle_batch(&config, BatchId(0), DriverId(0), &[10.0, 12.0], 3.0);
        let b = settle_batch(&config, BatchId(1), DriverId(1), &[30.0], 5.0);
        let summary = EconomicsSummary::from_batches([&a, &b]);
        assert_eq!(summary.batches, 2);
        assert_eq!(summary.orders, 3);
        assert!((summary.total_value - 52.0).abs() < 1e-9);
        assert!((summary.driver_pay - (a.driver_pay + b.driver_pay)).abs() < 1e-9);
    }

    #[test]
    fn ratio_validation_checks_range_and_sum() {
        assert!(SplitRatios::default().is_valid(1e-9));
        let negative = SplitRatios {
            chef: 1.1,
            platform: -0.1,
            delivery: 0.0,
        };
        assert!(!negative.is_valid(1e-9));
    }
}
