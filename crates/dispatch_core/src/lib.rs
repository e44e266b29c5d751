pub mod batching;
pub mod clock;
pub mod demand;
pub mod dispatch;
pub mod ecs;
pub mod error;
pub mod geo;
pub mod planning;
pub mod pricing;
pub mod report;
pub mod rng;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod simulation;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
