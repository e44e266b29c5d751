use std::error::Error;
use std::fs::File;

use crate::metrics::SweepResult;

pub(crate) fn export_to_json_impl(results: &[SweepResult], file: File) -> Result<(), Box<dyn Error>> {
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}
