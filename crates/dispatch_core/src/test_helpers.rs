//! Shared fixtures for unit tests, integration tests and benches.

use crate::geo::Coordinate;
use crate::scenario::{HubConfig, ScenarioParams};

pub const MITTE: Coordinate = Coordinate::new(52.5200, 13.4050);
pub const KREUZBERG: Coordinate = Coordinate::new(52.4986, 13.4030);

pub fn two_hubs() -> Vec<HubConfig> {
    vec![
        HubConfig::new("Mitte Kitchen", MITTE.lat, MITTE.lng),
        HubConfig::new("Kreuzberg Kitchen", KREUZBERG.lat, KREUZBERG.lng),
    ]
}

/// Seed 42, two hubs, 20 orders, 5km clustering, 20km service area,
/// three drivers at 28km/h, 12 minutes prep.
pub fn example_params() -> ScenarioParams {
    ScenarioParams::default()
        .with_seed(42)
        .with_hubs(two_hubs())
        .with_order_count(20)
        .with_clustering_radius_km(5.0)
        .with_service_radius_km(20.0)
        .with_driver_count(3)
        .with_speed_kmh(28.0)
        .with_prep_minutes(12.0)
}

/// One hub, one order, one driver.
pub fn single_order_params() -> ScenarioParams {
    ScenarioParams::default()
        .with_seed(7)
        .with_hubs(vec![HubConfig::new("Mitte Kitchen", MITTE.lat, MITTE.lng)])
        .with_order_count(1)
        .with_driver_count(1)
        .with_duration_minutes(30.0)
}

/// A larger run for benches and sweeps.
pub fn busy_params(order_count: usize, driver_count: usize) -> ScenarioParams {
    ScenarioParams::default()
        .with_hubs(two_hubs())
        .with_order_count(order_count)
        .with_driver_count(driver_count)
        .with_clustering_radius_km(1.5)
        .with_duration_minutes(240.0)
}
