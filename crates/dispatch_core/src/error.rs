use thiserror::Error;

use crate::ecs::{BatchId, HubId};

/// Rejected run configuration. Raised before any demand is generated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least one driver is required")]
    NoDrivers,

    #[error("at least one hub is required")]
    NoHubs,

    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("split ratios must each lie in [0, 1] and sum to 1.0 (sum is {sum})")]
    SplitRatios { sum: f64 },

    #[error("coordinate ({lat}, {lng}) is outside the valid lat/lng range")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("order value jitter must lie in [0, 1) (got {value})")]
    Jitter { value: f64 },

    #[error("sampling attempts must be at least 1")]
    SamplingAttempts,

    #[error("speed multiplier must be positive (got {value})")]
    SpeedMultiplier { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("driver pool is empty; {} batch(es) could not acquire a driver", batch_ids.len())]
    EmptyPool { batch_ids: Vec<BatchId> },

    #[error("batch {batch:?} references unknown hub {hub:?}")]
    UnknownHub { batch: BatchId, hub: HubId },
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("simulation world has not been initialized")]
    NotInitialized,

    #[error("demand has not been generated for this run")]
    DemandNotGenerated,

    #[error("run did not finish within {max_ticks} ticks")]
    TickBudgetExhausted { max_ticks: usize },
}

pub type SimResult<T> = Result<T, SimError>;
