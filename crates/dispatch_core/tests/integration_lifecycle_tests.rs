mod support;

use bevy_ecs::prelude::World;
use dispatch_core::ecs::{OrderLifecycle, OrderStatus};
use dispatch_core::report::{project_run, BatchStatus, RunReport};
use dispatch_core::runner::{run_until_delivered, simulation_schedule};
use dispatch_core::scenario::{build_scenario, populate_demand, HubConfig, ScenarioParams};
use dispatch_core::telemetry::SimTelemetry;
use dispatch_core::telemetry_export::validate_delivery_ordering;
use dispatch_core::test_helpers::{busy_params, example_params, KREUZBERG, MITTE};

fn drained_world(params: &ScenarioParams) -> World {
    let mut world = World::new();
    build_scenario(&mut world, params).expect("build");
    populate_demand(&mut world).expect("demand");
    let mut schedule = simulation_schedule();
    run_until_delivered(&mut world, &mut schedule, support::MAX_TICKS).expect("drain");
    world
}

#[test]
fn every_order_visits_every_status_exactly_once_in_order() {
    let mut world = drained_world(&example_params());
    let lifecycles: Vec<OrderLifecycle> = world
        .query::<&OrderLifecycle>()
        .iter(&world)
        .cloned()
        .collect();
    assert_eq!(lifecycles.len(), 20);

    for lifecycle in lifecycles {
        let statuses: Vec<OrderStatus> = lifecycle.history.iter().map(|c| c.status).collect();
        assert_eq!(statuses, OrderStatus::ALL.to_vec());
        for pair in lifecycle.history.windows(2) {
            assert!(pair[0].at <= pair[1].at, "history went back in time");
            assert!(pair[1].tick > pair[0].tick, "two steps in one tick");
        }
    }
}

#[test]
fn deliveries_never_precede_their_projected_arrival() {
    let world = drained_world(&busy_params(30, 2));
    let telemetry = world.resource::<SimTelemetry>();
    assert_eq!(telemetry.deliveries.len(), 30);
    for record in &telemetry.deliveries {
        assert_eq!(validate_delivery_ordering(record), None);
    }
}

#[test]
fn ticked_and_projected_runs_agree_on_assignments_and_pay() {
    let params = busy_params(30, 2);
    let projected = project_run(&params).expect("projected");
    let (_, ticked) = support::ticked_run(params);

    assert_eq!(ticked.totals.delivered, ticked.totals.orders);
    assert_eq!(ticked.batches.len(), projected.batches.len());
    for (t, p) in ticked.batches.iter().zip(&projected.batches) {
        assert_eq!(t.id, p.id);
        assert_eq!(t.driver_id, p.driver_id);
        support::assert_close(
            t.depart_at.expect("ticked depart"),
            p.depart_at.expect("projected depart"),
            "depart_at",
        );
        support::assert_close(
            t.finish_at.expect("ticked finish"),
            p.finish_at.expect("projected finish"),
            "finish_at",
        );
    }

    for (t, p) in ticked.drivers.iter().zip(&projected.drivers) {
        assert_eq!(t.id, p.id);
        support::assert_close(t.available_at, p.available_at, "available_at");
        support::assert_close(t.location.lat, p.location.lat, "release lat");
        support::assert_close(t.location.lng, p.location.lng, "release lng");
        support::assert_close(t.cumulative_km, p.cumulative_km, "cumulative_km");
        support::assert_close(
            t.cumulative_earnings,
            p.cumulative_earnings,
            "cumulative_earnings",
        );
        assert_eq!(t.completed_batches, p.completed_batches);
    }

    let (te, pe) = (&ticked.totals.economics, &projected.totals.economics);
    assert_eq!(te.batches, pe.batches);
    support::assert_close(te.total_value, pe.total_value, "total_value");
    support::assert_close(te.driver_pay, pe.driver_pay, "driver_pay");
    support::assert_close(te.delivery_margin, pe.delivery_margin, "delivery_margin");
}

#[test]
fn value_shares_are_conserved_per_batch() {
    let report = project_run(&example_params()).expect("report");
    for batch in &report.batches {
        let economics = batch.economics.expect("settled");
        let shares = economics.chef_share + economics.platform_share + economics.delivery_share;
        assert!((shares - economics.total_value).abs() < 1e-9);
        support::assert_close(
            economics.delivery_margin,
            economics.delivery_share - economics.driver_pay,
            "margin",
        );
    }
}

fn assert_delivered_after_creation(report: &RunReport) {
    for order in &report.orders {
        let delivered_at = order.delivered_at.expect("delivered");
        assert!(
            delivered_at >= order.created_at,
            "{:?} {:?}: created {} delivered {}",
            report.mode,
            order.id,
            order.created_at,
            delivered_at
        );
    }
}

#[test]
fn orders_are_never_delivered_before_they_exist() {
    for params in [example_params(), busy_params(30, 2)] {
        assert_delivered_after_creation(&project_run(&params).expect("projected"));
        let (_, ticked) = support::ticked_run(params);
        assert_delivered_after_creation(&ticked);
    }
}

#[test]
fn per_order_delivery_times_agree_across_modes() {
    let params = example_params();
    let tick = params.tick_minutes;
    let projected = project_run(&params).expect("projected");
    let (_, ticked) = support::ticked_run(params);

    assert_eq!(ticked.orders.len(), projected.orders.len());
    for (t, p) in ticked.orders.iter().zip(&projected.orders) {
        assert_eq!(t.id, p.id);
        assert_eq!(t.driver_id, p.driver_id);
        let arrive = p.delivered_at.expect("projected delivery");
        let observed = t.delivered_at.expect("ticked delivery");
        // Ticks observe the arrival on the next boundary; a leg shorter than
        // one tick can add one more step.
        assert!(
            observed >= arrive - 1e-9 && observed - arrive < 2.0 * tick,
            "{:?}: projected {arrive}, ticked {observed}",
            t.id
        );
    }
    let gap = ticked.totals.avg_delivery_minutes.expect("ticked avg")
        - projected.totals.avg_delivery_minutes.expect("projected avg");
    assert!((0.0..2.0 * tick).contains(&gap), "avg delivery gap {gap}");
}

#[test]
fn slow_hub_batches_never_cause_retroactive_departures() {
    let params = ScenarioParams::default()
        .with_hubs(vec![
            HubConfig::new("slow", MITTE.lat, MITTE.lng).with_prep_minutes(30.0),
            HubConfig::new("fast", KREUZBERG.lat, KREUZBERG.lng).with_prep_minutes(5.0),
        ])
        .with_order_count(40)
        .with_driver_count(3)
        .with_clustering_radius_km(1.0);
    let mut context = support::started_context(params.clone());

    let mut assigned_at = vec![None; context.batches().len()];
    for _ in 0..support::MAX_TICKS {
        let report = context.advance_tick().expect("tick");
        for batch in context.batches() {
            let slot = &mut assigned_at[batch.id.0 as usize];
            if slot.is_none() && batch.status != BatchStatus::Pending {
                let depart_at = batch.depart_at.expect("assigned batch departs");
                assert!(
                    depart_at >= report.now,
                    "{:?} assigned at {} departs at {depart_at}",
                    batch.id,
                    report.now
                );
                *slot = Some((report.now, batch.ready_at));
            }
        }
        if report.complete {
            break;
        }
    }

    let held_back = assigned_at
        .iter()
        .flatten()
        .filter(|(at, ready_at)| *at >= ready_at + 1.0)
        .count();
    assert!(held_back > 0, "no batch waited behind a slower one");

    let projected = project_run(&params).expect("projected");
    let ticked = context.report().expect("report");
    for (t, p) in ticked.batches.iter().zip(&projected.batches) {
        assert_eq!(t.driver_id, p.driver_id);
        support::assert_close(t.depart_at.expect("t"), p.depart_at.expect("p"), "depart_at");
    }
}
