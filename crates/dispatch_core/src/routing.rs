//! Route building: drop-off sequencing and leg timing.
//!
//! A [`RoutePlanner`] chooses the visiting order; [`build_batch_route`] times
//! the in-batch legs from the hub and [`build_dispatch_route`] prepends the
//! driver's approach leg once a driver is chosen.

mod exhaustive;
mod nearest;
mod planner;
mod route;

use bevy_ecs::prelude::Resource;

pub use exhaustive::ExhaustivePlanner;
pub use nearest::NearestNeighborPlanner;
pub use planner::{path_length_km, RoutePlanner};
pub use route::{build_batch_route, build_dispatch_route, Route, RouteLeg, RouteTiming, Stop};

use crate::scenario::RoutingStrategy;

/// Resource wrapper for the active planner.
#[derive(Resource)]
pub struct RoutePlannerResource(pub Box<dyn RoutePlanner>);

impl RoutePlannerResource {
    pub fn new(planner: Box<dyn RoutePlanner>) -> Self {
        Self(planner)
    }
}

impl std::ops::Deref for RoutePlannerResource {
    type Target = dyn RoutePlanner;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

pub fn planner_for(strategy: RoutingStrategy, exhaustive_max_stops: usize) -> Box<dyn RoutePlanner> {
    match strategy {
        RoutingStrategy::NearestNeighbor => Box::new(NearestNeighborPlanner),
        RoutingStrategy::Exhaustive => Box::new(ExhaustivePlanner::new(exhaustive_max_stops)),
    }
}
