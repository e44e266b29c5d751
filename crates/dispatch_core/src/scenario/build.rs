use std::collections::HashMap;

use bevy_ecs::prelude::World;
use serde::Serialize;
use tracing::info;

use crate::clock::SimulationClock;
use crate::dispatch::DispatchScheduler;
use crate::ecs::{
    BatchDispatch, Driver, DriverId, EntityIndex, HubDirectory, OrderLifecycle, PendingBatches,
};
use crate::error::{SimError, SimResult};
use crate::planning::plan_demand;
use crate::routing::{planner_for, RoutePlannerResource};
use crate::scenario::params::ScenarioParams;
use crate::telemetry::{SimSnapshots, SimTelemetry, TickActivity};

/// Validate `params` and insert every run resource plus the driver pool.
/// Any previous run state in `world` is replaced.
pub fn build_scenario(world: &mut World, params: &ScenarioParams) -> SimResult<()> {
    params.validate()?;
    world.clear_all();

    let hubs = params.resolve_hubs();
    let start = params.driver_start();

    world.insert_resource(params.clone());
    world.insert_resource(HubDirectory(hubs));
    world.insert_resource(SimulationClock::new(params.tick_minutes));
    world.insert_resource(DispatchScheduler::new(params.route_timing()));
    world.insert_resource(params.pricing());
    world.insert_resource(RoutePlannerResource::new(planner_for(
        params.routing_strategy,
        params.exhaustive_max_stops,
    )));
    world.insert_resource(PendingBatches::default());
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(TickActivity::default());
    world.insert_resource(SimSnapshots::with_capacity(params.snapshot_capacity));

    let mut index = EntityIndex::default();
    for i in 0..params.driver_count {
        let id = DriverId(i as u32);
        let entity = world.spawn(Driver::new(id, start, 0.0)).id();
        index.drivers.insert(id, entity);
    }
    world.insert_resource(index);

    info!(
        seed = params.seed,
        drivers = params.driver_count,
        hubs = params.hubs.len(),
        orders = params.order_count,
        "scenario initialized"
    );
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandSummary {
    pub orders: usize,
    pub batches: usize,
    pub sampling_fallbacks: usize,
}

/// Generate orders and batches for an initialized world and spawn them.
pub fn populate_demand(world: &mut World) -> SimResult<DemandSummary> {
    let params = world
        .get_resource::<ScenarioParams>()
        .cloned()
        .ok_or(SimError::NotInitialized)?;
    let plan = {
        let hubs = world
            .get_resource::<HubDirectory>()
            .ok_or(SimError::NotInitialized)?;
        let planner = world
            .get_resource::<RoutePlannerResource>()
            .ok_or(SimError::NotInitialized)?;
        plan_demand(&params, hubs, &**planner)?
    };

    let summary = DemandSummary {
        orders: plan.orders.len(),
        batches: plan.batches.len(),
        sampling_fallbacks: plan.sampling_fallbacks(),
    };

    let membership: HashMap<_, _> = plan
        .batches
        .iter()
        .flat_map(|batch| batch.order_ids.iter().map(move |order_id| (*order_id, batch.id)))
        .collect();

    let mut order_entities = Vec::with_capacity(plan.orders.len());
    for order in plan.orders {
        let mut lifecycle = OrderLifecycle::new(order.created_at);
        lifecycle.batch_id = membership.get(&order.id).copied();
        let id = order.id;
        order_entities.push((id, world.spawn((order, lifecycle)).id()));
    }

    let mut batch_entities = Vec::with_capacity(plan.batches.len());
    for batch in plan.batches {
        let id = batch.id;
        batch_entities.push((id, world.spawn((batch, BatchDispatch::default())).id()));
    }

    world
        .resource_mut::<PendingBatches>()
        .0
        .extend(batch_entities.iter().map(|(id, _)| *id));
    world.resource_mut::<SimTelemetry>().sampling_fallbacks = summary.sampling_fallbacks;

    let mut index = world.resource_mut::<EntityIndex>();
    index.orders.extend(order_entities);
    index.batches.extend(batch_entities);
    Ok(summary)
}
