//! Parallel sweep execution using rayon.

use clap::ValueEnum;
use dispatch_core::report::RunReport;
use dispatch_core::simulation::SimulationContext;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ExperimentError;
use crate::metrics::{extract_metrics, SweepResult};
use crate::parameters::ParameterSet;

/// Tick budget for ticked sweep runs.
pub const MAX_SWEEP_TICKS: usize = 200_000;

/// How each sweep run is executed. Both modes produce the same assignments;
/// `Projected` skips the tick loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum RunMode {
    #[default]
    Projected,
    Ticked,
}

/// Run one set in a fresh context and return its report.
pub fn run_report(set: &ParameterSet, mode: RunMode) -> Result<RunReport, ExperimentError> {
    let wrap = |source| ExperimentError::Simulation {
        run_id: set.run_id,
        source,
    };
    let mut context = SimulationContext::new(set.params.clone()).map_err(wrap)?;
    match mode {
        RunMode::Projected => context.full_run().map_err(wrap),
        RunMode::Ticked => {
            context.start(1.0).map_err(wrap)?;
            context.run_to_completion(MAX_SWEEP_TICKS).map_err(wrap)
        }
    }
}

pub fn run_single_simulation(
    set: &ParameterSet,
    mode: RunMode,
) -> Result<SweepResult, ExperimentError> {
    let report = run_report(set, mode)?;
    let result = extract_metrics(set, &report);
    debug!(
        run_id = set.run_id,
        seed = set.params.seed,
        avg_delivery_minutes = result.avg_delivery_minutes,
        delivery_margin = result.delivery_margin,
        "sweep run finished"
    );
    Ok(result)
}

/// Run every set on a rayon pool. Results keep the input order. The first
/// failing run aborts the sweep.
pub fn run_parallel_experiments(
    parameter_sets: &[ParameterSet],
    mode: RunMode,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<SweepResult>, ExperimentError> {
    let total = parameter_sets.len();
    let progress = (show_progress && total > 0).then(|| {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar
    });

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    info!(runs = total, ?mode, "starting sweep");
    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|set| {
                let result = run_single_simulation(set, mode);
                if let Some(bar) = &progress {
                    bar.inc(1);
                }
                result
            })
            .collect::<Result<Vec<_>, _>>()
    });

    if let Some(bar) = &progress {
        bar.finish_with_message("Completed");
    }
    results
}
