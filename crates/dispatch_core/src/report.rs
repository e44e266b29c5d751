//! Read models and the event-projected run report.
//!
//! [`project_run`] schedules a whole run up front: every leg timestamp is
//! known once dispatch is planned, so final metrics need no ticking. The
//! `*_views` functions read the same shapes out of a ticking world.

use std::collections::HashMap;

use bevy_ecs::prelude::World;
use serde::Serialize;
use tracing::info;

use crate::clock::SimulationClock;
use crate::dispatch::{plan_dispatch, DispatchScheduler, DriverSlot};
use crate::ecs::{
    Batch, BatchDispatch, BatchId, Driver, DriverId, DriverState, HubDirectory, HubId, Order,
    OrderId, OrderLifecycle, OrderStatus,
};
use crate::error::{SimError, SimResult};
use crate::geo::Coordinate;
use crate::planning::plan_demand;
use crate::pricing::{settle_batch, BatchEconomics, EconomicsSummary};
use crate::routing::{planner_for, Route};
use crate::scenario::ScenarioParams;
use crate::telemetry::SimTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportMode {
    Projected,
    Ticked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchStatus {
    Pending,
    Assigned,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub hub_id: HubId,
    pub status: OrderStatus,
    pub customer: Coordinate,
    pub created_at: f64,
    pub value: f64,
    pub distance_from_hub_km: f64,
    pub fallback: bool,
    pub batch_id: Option<BatchId>,
    pub driver_id: Option<DriverId>,
    pub eta: Option<f64>,
    pub delivered_at: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverView {
    pub id: DriverId,
    pub location: Coordinate,
    pub cell: Option<u64>,
    pub state: DriverState,
    pub available_at: f64,
    pub assigned_batch: Option<BatchId>,
    pub queued_batches: Vec<BatchId>,
    pub cumulative_km: f64,
    pub cumulative_earnings: f64,
    pub completed_batches: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchView {
    pub id: BatchId,
    pub hub_id: HubId,
    pub created_at: f64,
    pub ready_at: f64,
    pub order_ids: Vec<OrderId>,
    pub status: BatchStatus,
    pub driver_id: Option<DriverId>,
    pub depart_at: Option<f64>,
    pub finish_at: Option<f64>,
    /// Full dispatch route once assigned, the in-batch route before.
    pub route: Route,
    pub economics: Option<BatchEconomics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub orders: usize,
    pub delivered: usize,
    pub batches: usize,
    pub completed_batches: usize,
    pub failed_batches: usize,
    pub drivers: usize,
    pub idle_drivers: usize,
    pub sampling_fallbacks: usize,
    pub economics: EconomicsSummary,
    /// Mean creation-to-delivery time over delivered orders.
    pub avg_delivery_minutes: Option<f64>,
    /// Latest route finish among assigned batches.
    pub makespan_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub mode: ReportMode,
    pub seed: u64,
    pub tick: Option<u64>,
    pub now: f64,
    pub orders: Vec<OrderView>,
    pub drivers: Vec<DriverView>,
    pub batches: Vec<BatchView>,
    pub totals: Totals,
}

pub fn compute_totals(
    orders: &[OrderView],
    drivers: &[DriverView],
    batches: &[BatchView],
    failed_batches: usize,
) -> Totals {
    let delivered: Vec<&OrderView> = orders
        .iter()
        .filter(|order| order.status == OrderStatus::Delivered)
        .collect();
    let delivery_minutes: f64 = delivered
        .iter()
        .filter_map(|order| order.delivered_at.map(|at| at - order.created_at))
        .sum();

    Totals {
        orders: orders.len(),
        delivered: delivered.len(),
        batches: batches.len(),
        completed_batches: batches
            .iter()
            .filter(|batch| batch.status == BatchStatus::Completed)
            .count(),
        failed_batches,
        drivers: drivers.len(),
        idle_drivers: drivers
            .iter()
            .filter(|driver| driver.state == DriverState::Idle)
            .count(),
        sampling_fallbacks: orders.iter().filter(|order| order.fallback).count(),
        economics: EconomicsSummary::from_batches(
            batches.iter().filter_map(|batch| batch.economics.as_ref()),
        ),
        avg_delivery_minutes: (!delivered.is_empty())
            .then(|| delivery_minutes / delivered.len() as f64),
        makespan_minutes: batches
            .iter()
            .filter_map(|batch| batch.finish_at)
            .fold(0.0, f64::max),
    }
}

/// Plan and settle a whole run without ticking.
pub fn project_run(params: &ScenarioParams) -> SimResult<RunReport> {
    params.validate()?;
    let hubs = HubDirectory(params.resolve_hubs());
    let planner = planner_for(params.routing_strategy, params.exhaustive_max_stops);
    let plan = plan_demand(params, &hubs, planner.as_ref())?;

    let start = params.driver_start();
    let slots: Vec<DriverSlot> = (0..params.driver_count)
        .map(|i| DriverSlot {
            id: DriverId(i as u32),
            location: start,
            available_at: 0.0,
        })
        .collect();
    let scheduler = DispatchScheduler::new(params.route_timing());
    let dispatch = plan_dispatch(&scheduler, &plan.batches, &hubs, slots, params.tick_minutes)?;
    let pricing = params.pricing();

    let values: HashMap<OrderId, f64> = plan
        .orders
        .iter()
        .map(|order| (order.id, order.value))
        .collect();

    let mut order_rows: HashMap<OrderId, (BatchId, DriverId, f64)> = HashMap::new();
    let mut driver_totals: HashMap<DriverId, (f64, f64, u32)> = HashMap::new();
    let mut batches = Vec::with_capacity(plan.batches.len());

    for (batch, assignment) in plan.batches.iter().zip(&dispatch.assignments) {
        let order_values: Vec<f64> = batch
            .order_ids
            .iter()
            .filter_map(|id| values.get(id).copied())
            .collect();
        let economics = settle_batch(
            &pricing,
            batch.id,
            assignment.driver_id,
            &order_values,
            assignment.route_km(),
        );

        for order_id in &batch.order_ids {
            let arrive_at = assignment
                .route
                .leg_for_order(*order_id)
                .map(|leg| leg.arrive_at)
                .unwrap_or(assignment.finish_at);
            order_rows.insert(*order_id, (batch.id, assignment.driver_id, arrive_at));
        }
        let totals = driver_totals
            .entry(assignment.driver_id)
            .or_insert((0.0, 0.0, 0));
        totals.0 += economics.route_km;
        totals.1 += economics.driver_pay;
        totals.2 += 1;

        batches.push(BatchView {
            id: batch.id,
            hub_id: batch.hub_id,
            created_at: batch.created_at,
            ready_at: batch.ready_at,
            order_ids: batch.order_ids.clone(),
            status: BatchStatus::Completed,
            driver_id: Some(assignment.driver_id),
            depart_at: Some(assignment.depart_at),
            finish_at: Some(assignment.finish_at),
            route: assignment.route.clone(),
            economics: Some(economics),
        });
    }

    let orders: Vec<OrderView> = plan
        .orders
        .iter()
        .map(|order| {
            let row = order_rows.get(&order.id);
            OrderView {
                id: order.id,
                hub_id: order.hub_id,
                status: OrderStatus::Delivered,
                customer: order.customer,
                created_at: order.created_at,
                value: order.value,
                distance_from_hub_km: order.distance_from_hub_km,
                fallback: order.fallback,
                batch_id: row.map(|r| r.0),
                driver_id: row.map(|r| r.1),
                eta: row.map(|r| r.2),
                delivered_at: row.map(|r| r.2),
            }
        })
        .collect();

    let drivers: Vec<DriverView> = dispatch
        .drivers
        .iter()
        .map(|slot| {
            let (km, earnings, completed) =
                driver_totals.get(&slot.id).copied().unwrap_or((0.0, 0.0, 0));
            DriverView {
                id: slot.id,
                location: slot.location,
                cell: slot.location.cell().map(u64::from),
                state: DriverState::Idle,
                available_at: slot.available_at,
                assigned_batch: None,
                queued_batches: Vec::new(),
                cumulative_km: km,
                cumulative_earnings: earnings,
                completed_batches: completed,
            }
        })
        .collect();

    let totals = compute_totals(&orders, &drivers, &batches, 0);
    let now = totals.makespan_minutes;
    info!(
        orders = totals.orders,
        batches = totals.batches,
        makespan = now,
        margin = totals.economics.delivery_margin,
        "projected run complete"
    );
    Ok(RunReport {
        mode: ReportMode::Projected,
        seed: params.seed,
        tick: None,
        now,
        orders,
        drivers,
        batches,
        totals,
    })
}

/// Orders in a ticking world, sorted by id.
pub fn order_views(world: &mut World) -> Vec<OrderView> {
    let mut views: Vec<OrderView> = world
        .query::<(&Order, &OrderLifecycle)>()
        .iter(world)
        .map(|(order, lifecycle)| OrderView {
            id: order.id,
            hub_id: order.hub_id,
            status: lifecycle.status,
            customer: order.customer,
            created_at: order.created_at,
            value: order.value,
            distance_from_hub_km: order.distance_from_hub_km,
            fallback: order.fallback,
            batch_id: lifecycle.batch_id,
            driver_id: lifecycle.driver_id,
            eta: lifecycle.eta,
            delivered_at: lifecycle.reached_at(OrderStatus::Delivered),
        })
        .collect();
    views.sort_by_key(|view| view.id);
    views
}

/// Drivers in a ticking world, sorted by id.
pub fn driver_views(world: &mut World) -> Vec<DriverView> {
    let now = world
        .get_resource::<SimulationClock>()
        .map(SimulationClock::now)
        .unwrap_or(0.0);
    let mut views: Vec<DriverView> = world
        .query::<&Driver>()
        .iter(world)
        .map(|driver| DriverView {
            id: driver.id,
            location: driver.location,
            cell: driver.location.cell().map(u64::from),
            state: driver.state_at(now),
            available_at: driver.available_at,
            assigned_batch: driver.assigned_batch,
            queued_batches: driver.queue.iter().copied().collect(),
            cumulative_km: driver.cumulative_km,
            cumulative_earnings: driver.cumulative_earnings,
            completed_batches: driver.completed_batches,
        })
        .collect();
    views.sort_by_key(|view| view.id);
    views
}

/// Batches in a ticking world, sorted by id. Economics are present once the
/// batch is settled.
pub fn batch_views(world: &mut World) -> Vec<BatchView> {
    let settled: HashMap<BatchId, BatchEconomics> = world
        .get_resource::<SimTelemetry>()
        .map(|telemetry| {
            telemetry
                .completed_batches
                .iter()
                .map(|record| (record.batch_id, record.economics))
                .collect()
        })
        .unwrap_or_default();

    let mut views: Vec<BatchView> = world
        .query::<(&Batch, &BatchDispatch)>()
        .iter(world)
        .map(|(batch, dispatch)| {
            let assignment = dispatch.assignment.as_ref();
            let status = match (assignment, dispatch.completed_at) {
                (None, _) => BatchStatus::Pending,
                (Some(_), None) => BatchStatus::Assigned,
                (Some(_), Some(_)) => BatchStatus::Completed,
            };
            BatchView {
                id: batch.id,
                hub_id: batch.hub_id,
                created_at: batch.created_at,
                ready_at: batch.ready_at,
                order_ids: batch.order_ids.clone(),
                status,
                driver_id: assignment.map(|a| a.driver_id),
                depart_at: assignment.map(|a| a.depart_at),
                finish_at: assignment.map(|a| a.finish_at),
                route: assignment
                    .map(|a| a.route.clone())
                    .unwrap_or_else(|| batch.route.clone()),
                economics: settled.get(&batch.id).copied(),
            }
        })
        .collect();
    views.sort_by_key(|view| view.id);
    views
}

/// Report for a ticking world at its current tick.
pub fn tick_report(world: &mut World) -> SimResult<RunReport> {
    let params = world
        .get_resource::<ScenarioParams>()
        .cloned()
        .ok_or(SimError::NotInitialized)?;
    let clock = *world
        .get_resource::<SimulationClock>()
        .ok_or(SimError::NotInitialized)?;
    let failed = world
        .get_resource::<SimTelemetry>()
        .map(|telemetry| telemetry.failed_batches.len())
        .unwrap_or(0);

    let orders = order_views(world);
    let drivers = driver_views(world);
    let batches = batch_views(world);
    let totals = compute_totals(&orders, &drivers, &batches, failed);
    Ok(RunReport {
        mode: ReportMode::Ticked,
        seed: params.seed,
        tick: Some(clock.tick()),
        now: clock.now(),
        orders,
        drivers,
        batches,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::test_helpers::{example_params, single_order_params};

    #[test]
    fn projected_example_delivers_every_order() {
        let report = project_run(&example_params()).expect("report");
        assert_eq!(report.totals.orders, 20);
        assert_eq!(report.totals.delivered, 20);
        let members: usize = report.batches.iter().map(|b| b.order_ids.len()).sum();
        assert_eq!(members, 20);
        assert_eq!(report.totals.idle_drivers, 3);
        assert_eq!(report.totals.economics.batches, report.batches.len());
    }

    #[test]
    fn projected_single_order_advances_driver_by_route_duration() {
        let report = project_run(&single_order_params()).expect("report");
        assert_eq!(report.batches.len(), 1);
        let batch = &report.batches[0];
        assert_eq!(batch.route.legs.len(), 2);
        let driver = &report.drivers[0];
        let depart_at = batch.depart_at.expect("depart");
        assert!((driver.available_at - depart_at - batch.route.total_minutes()).abs() < 1e-9);
        assert_eq!(driver.completed_batches, 1);
    }

    #[test]
    fn projected_run_rejects_empty_pool() {
        let err = project_run(&example_params().with_driver_count(0)).unwrap_err();
        assert!(matches!(err, SimError::Config(ConfigError::NoDrivers)));
    }

    #[test]
    fn economics_conserve_value_per_batch() {
        let report = project_run(&example_params()).expect("report");
        for batch in &report.batches {
            let e = batch.economics.expect("economics");
            assert!((e.chef_share + e.platform_share + e.delivery_share - e.total_value).abs() < 1e-6);
        }
        let value: f64 = report.orders.iter().map(|o| o.value).sum();
        assert!((report.totals.economics.total_value - value).abs() < 1e-6);
    }
}
