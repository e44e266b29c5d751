use std::error::Error;
use std::fs::File;
use std::path::Path;

use crate::error::ExperimentError;

pub(crate) fn ensure_not_empty<T>(items: &[T]) -> Result<(), Box<dyn Error>> {
    if items.is_empty() {
        return Err(ExperimentError::NoResults.into());
    }
    Ok(())
}

/// Create `path`, making parent directories as needed.
pub(crate) fn create_output_file(path: impl AsRef<Path>) -> Result<File, Box<dyn Error>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

pub(crate) fn routing_label(strategy: dispatch_core::scenario::RoutingStrategy) -> &'static str {
    match strategy {
        dispatch_core::scenario::RoutingStrategy::NearestNeighbor => "nearestNeighbor",
        dispatch_core::scenario::RoutingStrategy::Exhaustive => "exhaustive",
    }
}
