mod support;

use bevy_ecs::prelude::World;
use dispatch_core::ecs::{Batch, Driver, DriverState, Order};
use dispatch_core::error::{ConfigError, SimError};
use dispatch_core::report::project_run;
use dispatch_core::scenario::{build_scenario, populate_demand, HubConfig};
use dispatch_core::simulation::SimulationContext;
use dispatch_core::test_helpers::{example_params, single_order_params, MITTE};

#[test]
fn example_scenario_generates_twenty_orders_in_complete_batches() {
    let mut world = World::new();
    build_scenario(&mut world, &example_params()).expect("build");
    let summary = populate_demand(&mut world).expect("demand");
    assert_eq!(summary.orders, 20);

    let orders = world.query::<&Order>().iter(&world).count();
    assert_eq!(orders, 20);

    let members: usize = world
        .query::<&Batch>()
        .iter(&world)
        .map(|batch| batch.order_ids.len())
        .sum();
    assert_eq!(members, 20);

    let idle = world
        .query::<&Driver>()
        .iter(&world)
        .filter(|driver| driver.state_at(0.0) == DriverState::Idle)
        .count();
    assert_eq!(idle, 3);
}

#[test]
fn every_order_lands_within_its_hub_radius() {
    let mut world = World::new();
    let params = example_params();
    build_scenario(&mut world, &params).expect("build");
    populate_demand(&mut world).expect("demand");
    for order in world.query::<&Order>().iter(&world) {
        assert!(order.distance_from_hub_km <= params.max_customer_km + 1e-9);
        assert!(order.created_at >= 0.0 && order.created_at <= params.duration_minutes);
    }
}

#[test]
fn zero_drivers_is_rejected_before_any_demand_exists() {
    let err = SimulationContext::new(example_params().with_driver_count(0))
        .err()
        .expect("configuration should be rejected");
    assert!(matches!(err, SimError::Config(ConfigError::NoDrivers)));

    let mut world = World::new();
    assert!(build_scenario(&mut world, &example_params().with_driver_count(0)).is_err());
    assert_eq!(world.query::<&Batch>().iter(&world).count(), 0);
    assert_eq!(world.query::<&Order>().iter(&world).count(), 0);
}

#[test]
fn missing_hubs_are_rejected() {
    let err = project_run(&example_params().with_hubs(Vec::new())).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::NoHubs)));
}

#[test]
fn invalid_hub_coordinate_is_rejected() {
    let params = example_params().with_hubs(vec![HubConfig::new("nowhere", 120.0, MITTE.lng)]);
    let err = project_run(&params).unwrap_err();
    assert!(matches!(
        err,
        SimError::Config(ConfigError::InvalidCoordinate { .. })
    ));
}

#[test]
fn single_order_produces_one_batch_and_advances_its_driver() {
    let report = project_run(&single_order_params()).expect("report");
    assert_eq!(report.totals.orders, 1);
    assert_eq!(report.batches.len(), 1);
    let batch = &report.batches[0];
    assert_eq!(batch.order_ids.len(), 1);

    let driver = &report.drivers[0];
    let depart_at = batch.depart_at.expect("batch should be dispatched");
    support::assert_close(
        driver.available_at,
        depart_at + batch.route.total_minutes(),
        "driver availability",
    );
    assert!(driver.available_at > 0.0);
}
