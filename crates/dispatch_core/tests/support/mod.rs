#![allow(dead_code)]

use dispatch_core::report::RunReport;
use dispatch_core::scenario::ScenarioParams;
use dispatch_core::simulation::SimulationContext;

/// Enough ticks for any fixture in this suite to drain.
pub const MAX_TICKS: usize = 20_000;

/// Tolerance for comparing minutes and kilometres across run modes.
pub const EPS: f64 = 1e-6;

/// Build a context, generate demand and start it at 1x.
pub fn started_context(params: ScenarioParams) -> SimulationContext {
    let mut context = SimulationContext::new(params).expect("params should validate");
    context.start(1.0).expect("context should start");
    context
}

/// Tick a fresh run to completion and return the context with its report.
pub fn ticked_run(params: ScenarioParams) -> (SimulationContext, RunReport) {
    let mut context = started_context(params);
    let report = context
        .run_to_completion(MAX_TICKS)
        .expect("run should finish within budget");
    (context, report)
}

pub fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < EPS,
        "{what}: expected {expected}, got {actual}"
    );
}
