//! Scenario setup: run configuration and world construction.
//!
//! [`ScenarioParams`] is validated eagerly; [`build_scenario`] inserts the
//! run resources and driver entities, [`populate_demand`] adds orders and
//! batches once demand is generated.

mod build;
mod params;

pub use build::{build_scenario, populate_demand, DemandSummary};
pub use params::{
    HubConfig, RoutingStrategy, ScenarioParams, DEFAULT_EXHAUSTIVE_MAX_STOPS,
    DEFAULT_SAMPLING_ATTEMPTS,
};
