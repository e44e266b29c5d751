use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::{Hub, HubId};
use crate::error::ConfigError;
use crate::geo::Coordinate;
use crate::pricing::{PricingConfig, SplitRatios};
use crate::routing::RouteTiming;

/// Default exhaustive search limit; 7 stops is 5040 permutations per batch.
pub const DEFAULT_EXHAUSTIVE_MAX_STOPS: usize = 7;

pub const DEFAULT_SAMPLING_ATTEMPTS: u32 = 400;

const SPLIT_TOLERANCE: f64 = 1e-9;

/// Which sequencing heuristic orders the drop-offs of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutingStrategy {
    #[default]
    NearestNeighbor,
    /// Permutation search up to `exhaustive_max_stops` drop-offs, nearest-neighbor above.
    Exhaustive,
}

/// One configured pickup hub. Unset overrides fall back to the global values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubConfig {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delivery_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_minutes: Option<f64>,
}

impl HubConfig {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            max_delivery_km: None,
            prep_minutes: None,
        }
    }

    pub fn with_max_delivery_km(mut self, km: f64) -> Self {
        self.max_delivery_km = Some(km);
        self
    }

    pub fn with_prep_minutes(mut self, minutes: f64) -> Self {
        self.prep_minutes = Some(minutes);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Every recognised run option. Times are simulated minutes, distances
/// kilometres, money in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioParams {
    pub order_count: usize,
    /// Orders are created uniformly inside [0, duration_minutes).
    pub duration_minutes: f64,
    pub seed: u64,
    pub driver_count: usize,
    pub hubs: Vec<HubConfig>,
    pub clustering_radius_km: f64,
    /// Customers must lie within this distance of the service center.
    pub service_radius_km: f64,
    /// Defaults to the hub centroid.
    pub service_center: Option<Coordinate>,
    /// Shared driver start position. Defaults to the service center.
    pub driver_start: Option<Coordinate>,
    /// Global maximum customer distance from its hub.
    pub max_customer_km: f64,
    pub speed_kmh: f64,
    pub prep_minutes: f64,
    pub pickup_minutes: f64,
    pub dropoff_minutes: f64,
    /// Delay between creation and acceptance in tick mode.
    pub accept_minutes: f64,
    pub base_fee_per_batch: f64,
    pub per_km_rate: f64,
    pub split_ratios: SplitRatios,
    pub avg_order_value: f64,
    /// Relative spread of order values around the average, in [0, 1).
    pub order_value_jitter: f64,
    pub sampling_attempts: u32,
    pub tick_minutes: f64,
    pub routing_strategy: RoutingStrategy,
    pub exhaustive_max_stops: usize,
    /// Ring buffer size for per-tick snapshots. 0 disables snapshots.
    pub snapshot_capacity: usize,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            order_count: 20,
            duration_minutes: 120.0,
            seed: 42,
            driver_count: 3,
            hubs: vec![
                HubConfig::new("Mitte Kitchen", 52.5200, 13.4050),
                HubConfig::new("Kreuzberg Kitchen", 52.4986, 13.4030),
            ],
            clustering_radius_km: 5.0,
            service_radius_km: 20.0,
            service_center: None,
            driver_start: None,
            max_customer_km: 6.0,
            speed_kmh: 28.0,
            prep_minutes: 12.0,
            pickup_minutes: 3.0,
            dropoff_minutes: 2.0,
            accept_minutes: 1.0,
            base_fee_per_batch: 2.5,
            per_km_rate: 0.6,
            split_ratios: SplitRatios::default(),
            avg_order_value: 28.0,
            order_value_jitter: 0.35,
            sampling_attempts: DEFAULT_SAMPLING_ATTEMPTS,
            tick_minutes: 1.0,
            routing_strategy: RoutingStrategy::NearestNeighbor,
            exhaustive_max_stops: DEFAULT_EXHAUSTIVE_MAX_STOPS,
            snapshot_capacity: 1000,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_order_count(mut self, count: usize) -> Self {
        self.order_count = count;
        self
    }

    pub fn with_driver_count(mut self, count: usize) -> Self {
        self.driver_count = count;
        self
    }

    pub fn with_hubs(mut self, hubs: Vec<HubConfig>) -> Self {
        self.hubs = hubs;
        self
    }

    pub fn with_clustering_radius_km(mut self, km: f64) -> Self {
        self.clustering_radius_km = km;
        self
    }

    pub fn with_service_radius_km(mut self, km: f64) -> Self {
        self.service_radius_km = km;
        self
    }

    pub fn with_service_center(mut self, center: Coordinate) -> Self {
        self.service_center = Some(center);
        self
    }

    pub fn with_driver_start(mut self, start: Coordinate) -> Self {
        self.driver_start = Some(start);
        self
    }

    pub fn with_speed_kmh(mut self, speed: f64) -> Self {
        self.speed_kmh = speed;
        self
    }

    pub fn with_prep_minutes(mut self, minutes: f64) -> Self {
        self.prep_minutes = minutes;
        self
    }

    pub fn with_duration_minutes(mut self, minutes: f64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_routing_strategy(mut self, strategy: RoutingStrategy) -> Self {
        self.routing_strategy = strategy;
        self
    }

    pub fn with_tick_minutes(mut self, minutes: f64) -> Self {
        self.tick_minutes = minutes;
        self
    }

    /// Reject the configuration before any state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver_count == 0 {
            return Err(ConfigError::NoDrivers);
        }
        if self.hubs.is_empty() {
            return Err(ConfigError::NoHubs);
        }

        positive("clusteringRadiusKm", self.clustering_radius_km)?;
        positive("serviceRadiusKm", self.service_radius_km)?;
        positive("maxCustomerKm", self.max_customer_km)?;
        positive("speedKmh", self.speed_kmh)?;
        positive("durationMinutes", self.duration_minutes)?;
        positive("tickMinutes", self.tick_minutes)?;
        positive("avgOrderValue", self.avg_order_value)?;

        non_negative("prepMinutes", self.prep_minutes)?;
        non_negative("pickupMinutes", self.pickup_minutes)?;
        non_negative("dropoffMinutes", self.dropoff_minutes)?;
        non_negative("acceptMinutes", self.accept_minutes)?;
        non_negative("baseFeePerBatch", self.base_fee_per_batch)?;
        non_negative("perKmRate", self.per_km_rate)?;

        if !self.split_ratios.is_valid(SPLIT_TOLERANCE) {
            return Err(ConfigError::SplitRatios {
                sum: self.split_ratios.sum(),
            });
        }
        if !(0.0..1.0).contains(&self.order_value_jitter) {
            return Err(ConfigError::Jitter {
                value: self.order_value_jitter,
            });
        }
        if self.sampling_attempts == 0 {
            return Err(ConfigError::SamplingAttempts);
        }

        for hub in &self.hubs {
            valid_coordinate(hub.coordinate())?;
            if let Some(km) = hub.max_delivery_km {
                positive("hubs.maxDeliveryKm", km)?;
            }
            if let Some(minutes) = hub.prep_minutes {
                non_negative("hubs.prepMinutes", minutes)?;
            }
        }
        if let Some(center) = self.service_center {
            valid_coordinate(center)?;
        }
        if let Some(start) = self.driver_start {
            valid_coordinate(start)?;
        }
        Ok(())
    }

    /// Hubs with ids assigned in configuration order and overrides applied.
    pub fn resolve_hubs(&self) -> Vec<Hub> {
        self.hubs
            .iter()
            .enumerate()
            .map(|(i, hub)| Hub {
                id: HubId(i as u32),
                name: hub.name.clone(),
                coordinate: hub.coordinate(),
                max_delivery_km: hub.max_delivery_km.unwrap_or(self.max_customer_km),
                prep_minutes: hub.prep_minutes.unwrap_or(self.prep_minutes),
            })
            .collect()
    }

    pub fn service_center(&self) -> Coordinate {
        self.service_center
            .or_else(|| Coordinate::centroid(self.hubs.iter().map(HubConfig::coordinate)))
            .unwrap_or(Coordinate::new(0.0, 0.0))
    }

    pub fn driver_start(&self) -> Coordinate {
        self.driver_start.unwrap_or_else(|| self.service_center())
    }

    pub fn route_timing(&self) -> RouteTiming {
        RouteTiming {
            speed_kmh: self.speed_kmh,
            pickup_minutes: self.pickup_minutes,
            dropoff_minutes: self.dropoff_minutes,
        }
    }

    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            split: self.split_ratios,
            base_fee_per_batch: self.base_fee_per_batch,
            per_km_rate: self.per_km_rate,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn valid_coordinate(coordinate: Coordinate) -> Result<(), ConfigError> {
    if coordinate.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::InvalidCoordinate {
            lat: coordinate.lat,
            lng: coordinate.lng,
        })
    }
}
