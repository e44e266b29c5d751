use std::collections::VecDeque;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::Schema;

use crate::ecs::OrderStatus;
use crate::telemetry::{SimCounts, SimSnapshot, SimSnapshots};

use super::utils::{f64_field, u64_field, write_record_batch};

/// One row per snapshot: tick, time and every count column.
pub fn write_snapshot_counts_parquet<P: AsRef<Path>>(
    path: P,
    snapshots: &SimSnapshots,
) -> Result<(), Box<dyn Error>> {
    let rows = &snapshots.snapshots;

    let mut fields = vec![u64_field("tick"), f64_field("now")];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|s| s.tick))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|s| s.now))),
    ];

    const STATUS_COLUMNS: [&str; 7] = [
        "orders_created",
        "orders_accepted",
        "orders_preparing",
        "orders_ready",
        "orders_picked_up",
        "orders_en_route",
        "orders_delivered",
    ];
    for (status, name) in OrderStatus::ALL.iter().zip(STATUS_COLUMNS) {
        fields.push(u64_field(name));
        arrays.push(count_column(rows, |counts| counts.orders_in(*status)));
    }

    fields.push(u64_field("drivers_idle"));
    arrays.push(count_column(rows, |counts| counts.drivers_idle));
    fields.push(u64_field("drivers_busy"));
    arrays.push(count_column(rows, |counts| counts.drivers_busy));
    fields.push(u64_field("batches_pending"));
    arrays.push(count_column(rows, |counts| counts.batches_pending));
    fields.push(u64_field("batches_assigned"));
    arrays.push(count_column(rows, |counts| counts.batches_assigned));
    fields.push(u64_field("batches_completed"));
    arrays.push(count_column(rows, |counts| counts.batches_completed));

    write_record_batch(path, Schema::new(fields), arrays)
}

fn count_column(rows: &VecDeque<SimSnapshot>, count: impl Fn(&SimCounts) -> usize) -> ArrayRef {
    Arc::new(UInt64Array::from_iter_values(
        rows.iter().map(|snapshot| count(&snapshot.counts) as u64),
    ))
}
