//! JSON scenario configuration files.

use std::fs;
use std::path::Path;

use dispatch_core::scenario::ScenarioParams;
use tracing::info;

use crate::error::ExperimentError;

/// Read a [`ScenarioParams`] JSON document. Missing keys take their defaults;
/// validation happens when a run is built from the result.
pub fn load_params(path: impl AsRef<Path>) -> Result<ScenarioParams, ExperimentError> {
    let path = path.as_ref();
    let path_display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| ExperimentError::ConfigRead {
        path: path_display.clone(),
        source,
    })?;
    let params: ScenarioParams =
        serde_json::from_str(&text).map_err(|source| ExperimentError::ConfigParse {
            path: path_display.clone(),
            source,
        })?;
    info!(path = %path_display, seed = params.seed, "loaded scenario config");
    Ok(params)
}
