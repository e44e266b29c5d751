//! Demand planning: generate orders, cluster them and route each batch.

use std::collections::HashMap;

use tracing::info;

use crate::batching::{cluster_orders, OrderCluster};
use crate::ecs::{Batch, BatchId, HubDirectory, Order, OrderId};
use crate::demand::generate_orders;
use crate::error::DispatchError;
use crate::routing::{build_batch_route, RoutePlanner, RouteTiming};
use crate::scenario::ScenarioParams;

/// Orders and routed batches for one run, both in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandPlan {
    pub orders: Vec<Order>,
    pub batches: Vec<Batch>,
}

impl DemandPlan {
    pub fn sampling_fallbacks(&self) -> usize {
        self.orders.iter().filter(|order| order.fallback).count()
    }
}

/// Turn clusters into batches. Ids follow cluster order. A batch is ready
/// once its latest member exists and the hub's preparation time has passed.
pub fn build_batches(
    orders: &[Order],
    clusters: &[OrderCluster],
    hubs: &HubDirectory,
    planner: &dyn RoutePlanner,
    timing: &RouteTiming,
) -> Result<Vec<Batch>, DispatchError> {
    let by_id: HashMap<OrderId, &Order> = orders.iter().map(|order| (order.id, order)).collect();

    clusters
        .iter()
        .enumerate()
        .map(|(i, cluster)| {
            let id = BatchId(i as u32);
            let hub = hubs.get(cluster.hub_id).ok_or(DispatchError::UnknownHub {
                batch: id,
                hub: cluster.hub_id,
            })?;
            let members: Vec<&Order> = cluster
                .order_ids
                .iter()
                .filter_map(|order_id| by_id.get(order_id).copied())
                .collect();
            let latest = members
                .iter()
                .map(|order| order.created_at)
                .fold(cluster.created_at, f64::max);
            let stops: Vec<_> = members.iter().map(|order| (order.id, order.customer)).collect();
            Ok(Batch {
                id,
                hub_id: cluster.hub_id,
                created_at: cluster.created_at,
                ready_at: latest + hub.prep_minutes,
                order_ids: cluster.order_ids.clone(),
                route: build_batch_route(planner, timing, hub, &stops),
            })
        })
        .collect()
}

pub fn plan_demand(
    params: &ScenarioParams,
    hubs: &HubDirectory,
    planner: &dyn RoutePlanner,
) -> Result<DemandPlan, DispatchError> {
    let orders = generate_orders(params, &hubs.0, params.service_center());
    let clusters = cluster_orders(&orders, params.clustering_radius_km);
    let batches = build_batches(&orders, &clusters, hubs, planner, &params.route_timing())?;

    let plan = DemandPlan { orders, batches };
    info!(
        orders = plan.orders.len(),
        batches = plan.batches.len(),
        fallbacks = plan.sampling_fallbacks(),
        planner = planner.name(),
        "demand generated"
    );
    Ok(plan)
}
