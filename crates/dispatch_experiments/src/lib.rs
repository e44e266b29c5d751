//! Parallel parameter sweeps over the dispatch simulator.
//!
//! A [`ParameterSpace`] expands into [`ParameterSet`]s (grid or random
//! sample), [`run_parallel_experiments`] executes each set in its own
//! simulation context on a rayon pool, and the resulting [`SweepResult`]s
//! can be scored with [`ScoreWeights`] and exported to JSON, CSV or Parquet.
//!
//! ```no_run
//! use dispatch_experiments::{
//!     find_best_result_index, run_parallel_experiments, ParameterSpace, RunMode, ScoreWeights,
//! };
//!
//! let sets = ParameterSpace::grid()
//!     .seeds(vec![1, 2, 3])
//!     .driver_counts(vec![2, 3, 4])
//!     .clustering_radii_km(vec![1.5, 3.0])
//!     .generate();
//! let results = run_parallel_experiments(&sets, RunMode::Projected, None, true).unwrap();
//! let best = find_best_result_index(&results, &ScoreWeights::default());
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;
pub mod score;

pub use config::load_params;
pub use error::ExperimentError;
pub use export::{export_to_csv, export_to_json, export_to_parquet};
pub use metrics::SweepResult;
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{run_parallel_experiments, run_single_simulation, RunMode};
pub use score::{calculate_scores, find_best_result_index, ScoreWeights};
