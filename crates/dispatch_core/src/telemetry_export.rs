//! Parquet export of run telemetry and read models.

mod batches;
mod deliveries;
mod orders;
mod snapshots;
mod utils;
mod validate;

pub use batches::write_completed_batches_parquet;
pub use deliveries::write_deliveries_parquet;
pub use orders::write_orders_parquet;
pub use snapshots::write_snapshot_counts_parquet;
pub use validate::validate_delivery_ordering;
