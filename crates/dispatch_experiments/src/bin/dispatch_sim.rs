use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dispatch_core::report::RunReport;
use dispatch_core::scenario::ScenarioParams;
use dispatch_core::simulation::SimulationContext;
use dispatch_core::telemetry_export::{
    write_completed_batches_parquet, write_deliveries_parquet, write_orders_parquet,
    write_snapshot_counts_parquet,
};
use dispatch_experiments::runner::MAX_SWEEP_TICKS;
use dispatch_experiments::{
    calculate_scores, export_to_csv, export_to_json, export_to_parquet, find_best_result_index,
    load_params, run_parallel_experiments, ParameterSpace, RunMode, ScoreWeights,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "dispatch_core=info,dispatch_experiments=info";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "dispatch_sim",
    about = "Delivery batching, routing and dispatch simulator",
    long_about = "Run a single delivery simulation, step through one tick by tick,\n\
                  or sweep parameters across many runs in parallel."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScenarioArgs {
    /// JSON scenario config; unset keys take their defaults
    #[arg(long, env = "DISPATCH_SIM_CONFIG")]
    config: Option<PathBuf>,
    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,
    /// Override the config driver count
    #[arg(long)]
    drivers: Option<usize>,
}

impl ScenarioArgs {
    fn params(&self) -> Result<ScenarioParams, Box<dyn std::error::Error>> {
        let mut params = match &self.config {
            Some(path) => load_params(path)?,
            None => ScenarioParams::default(),
        };
        if let Some(seed) = self.seed {
            params = params.with_seed(seed);
        }
        if let Some(drivers) = self.drivers {
            params = params.with_driver_count(drivers);
        }
        Ok(params)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scenario to completion and print its report
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Projected settles everything up front; ticked runs the lifecycle engine
        #[arg(value_enum, long, default_value_t = RunMode::Projected)]
        mode: RunMode,
        /// Write the full JSON report here instead of a summary to stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write orders, deliveries, batches and snapshot counts as Parquet
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Advance a scenario tick by tick, printing one JSON line per tick
    Step {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Number of ticks to advance
        #[arg(long, default_value_t = 10)]
        ticks: usize,
    },
    /// Run a parameter sweep in parallel and export the results
    Sweep {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Seeds to sweep
        #[arg(long, value_delimiter = ',')]
        seeds: Vec<u64>,
        /// Driver counts to sweep
        #[arg(long, value_delimiter = ',')]
        driver_counts: Vec<usize>,
        /// Clustering radii (km) to sweep
        #[arg(long, value_delimiter = ',')]
        radii: Vec<f64>,
        /// Order counts to sweep
        #[arg(long, value_delimiter = ',')]
        order_counts: Vec<usize>,
        /// Sample this many grid points at random instead of the full grid
        #[arg(long)]
        sample: Option<usize>,
        #[arg(long, default_value_t = 42)]
        sample_seed: u64,
        #[arg(value_enum, long, default_value_t = RunMode::Projected)]
        mode: RunMode,
        /// Worker threads; defaults to the number of cores
        #[arg(long)]
        threads: Option<usize>,
        /// Directory for results.json, results.csv and results.parquet
        #[arg(long, default_value = "sweep_results")]
        out_dir: PathBuf,
        #[arg(long)]
        no_progress: bool,
    },
}

// ── commands ───────────────────────────────────────────────────────

fn run(
    scenario: &ScenarioArgs,
    mode: RunMode,
    output: Option<&Path>,
    export_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut context = SimulationContext::new(scenario.params()?)?;
    let report = match mode {
        RunMode::Projected => context.full_run()?,
        RunMode::Ticked => {
            context.start(1.0)?;
            context.run_to_completion(MAX_SWEEP_TICKS)?
        }
    };

    if let Some(dir) = export_dir {
        std::fs::create_dir_all(dir)?;
        write_orders_parquet(dir.join("orders.parquet"), &report.orders)?;
        if mode == RunMode::Ticked {
            if let Some(telemetry) = context.telemetry() {
                write_deliveries_parquet(dir.join("deliveries.parquet"), telemetry)?;
                write_completed_batches_parquet(dir.join("batches.parquet"), telemetry)?;
            }
            if let Some(snapshots) = context.snapshots() {
                write_snapshot_counts_parquet(dir.join("snapshot_counts.parquet"), snapshots)?;
            }
        }
        info!(dir = %dir.display(), "exported parquet files");
    }

    match output {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
            info!(path = %path.display(), "wrote report");
        }
        None => print_summary(&report),
    }
    Ok(())
}

fn step(scenario: &ScenarioArgs, ticks: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut context = SimulationContext::new(scenario.params()?)?;
    context.start(1.0)?;
    for _ in 0..ticks {
        let report = context.advance_tick()?;
        println!("{}", serde_json::to_string(&report)?);
        if report.complete {
            break;
        }
    }
    println!("{}", serde_json::to_string(&context.status())?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn sweep(
    scenario: &ScenarioArgs,
    seeds: Vec<u64>,
    driver_counts: Vec<usize>,
    radii: Vec<f64>,
    order_counts: Vec<usize>,
    sample: Option<usize>,
    sample_seed: u64,
    mode: RunMode,
    threads: Option<usize>,
    out_dir: &Path,
    show_progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let space = ParameterSpace::new(scenario.params()?)
        .seeds(seeds)
        .driver_counts(driver_counts)
        .clustering_radii_km(radii)
        .order_counts(order_counts);
    let sets = match sample {
        Some(count) => space.sample_random(count, sample_seed),
        None => space.generate(),
    };
    info!(runs = sets.len(), grid = space.grid_size(), "generated parameter sets");

    let results = run_parallel_experiments(&sets, mode, threads, show_progress)?;

    std::fs::create_dir_all(out_dir)?;
    export_to_json(&results, out_dir.join("results.json"))?;
    if !results.is_empty() {
        export_to_csv(&results, out_dir.join("results.csv"))?;
        export_to_parquet(&results, out_dir.join("results.parquet"))?;
    }

    let weights = ScoreWeights::default();
    if let Some(best) = find_best_result_index(&results, &weights) {
        let scores = calculate_scores(&results, &weights);
        let r = &results[best];
        println!("=== Best configuration (score {:.3}) ===", scores[best]);
        println!("Seed: {}", r.seed);
        println!("Drivers: {}", r.driver_count);
        println!("Orders: {}", r.order_count);
        println!("Clustering radius: {:.2} km", r.clustering_radius_km);
        println!("Avg delivery time: {:.1} min", r.avg_delivery_minutes);
        println!("Driver utilisation: {:.1}%", r.driver_utilisation * 100.0);
        println!("Delivery margin: {:.2}", r.delivery_margin);
    }
    println!("Results written to {}", out_dir.display());
    Ok(())
}

fn print_summary(report: &RunReport) {
    let totals = &report.totals;
    println!("--- {:?} run, seed {} ---", report.mode, report.seed);
    println!("Orders delivered: {}/{}", totals.delivered, totals.orders);
    println!("Batches: {} ({} completed)", totals.batches, totals.completed_batches);
    println!("Makespan: {:.1} min", totals.makespan_minutes);
    if let Some(avg) = totals.avg_delivery_minutes {
        println!("Avg delivery time: {avg:.1} min");
    }
    println!("Sampling fallbacks: {}", totals.sampling_fallbacks);
    println!(
        "Value {:.2} | chef {:.2} | platform {:.2} | delivery {:.2}",
        totals.economics.total_value,
        totals.economics.chef_share,
        totals.economics.platform_share,
        totals.economics.delivery_share
    );
    println!(
        "Driver pay {:.2} | delivery margin {:.2} | route km {:.2}",
        totals.economics.driver_pay, totals.economics.delivery_margin, totals.economics.route_km
    );
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run {
            scenario,
            mode,
            output,
            export_dir,
        } => run(&scenario, mode, output.as_deref(), export_dir.as_deref()),
        Commands::Step { scenario, ticks } => step(&scenario, ticks),
        Commands::Sweep {
            scenario,
            seeds,
            driver_counts,
            radii,
            order_counts,
            sample,
            sample_seed,
            mode,
            threads,
            out_dir,
            no_progress,
        } => sweep(
            &scenario,
            seeds,
            driver_counts,
            radii,
            order_counts,
            sample,
            sample_seed,
            mode,
            threads,
            &out_dir,
            !no_progress,
        ),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "dispatch_sim failed");
            ExitCode::FAILURE
        }
    }
}
