use dispatch_core::error::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("simulation failed for run {run_id}: {source}")]
    Simulation {
        run_id: usize,
        #[source]
        source: SimError,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no results to export")]
    NoResults,
}
