use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::ecs::{BatchDispatch, Driver, DriverState, Order, OrderLifecycle, OrderStatus};
use crate::telemetry::{DriverSnapshot, OrderSnapshot, SimCounts, SimSnapshot, SimSnapshots};

/// Tally order statuses, driver states and batch dispatch progress.
pub fn count_states<'a>(
    orders: impl IntoIterator<Item = OrderStatus>,
    drivers: impl IntoIterator<Item = DriverState>,
    batches: impl IntoIterator<Item = &'a BatchDispatch>,
) -> SimCounts {
    let mut counts = SimCounts::default();
    for status in orders {
        counts.add_order(status);
    }
    for state in drivers {
        counts.add_driver(state);
    }
    for dispatch in batches {
        match (&dispatch.assignment, dispatch.completed_at) {
            (None, _) => counts.batches_pending += 1,
            (Some(_), None) => counts.batches_assigned += 1,
            (Some(_), Some(_)) => counts.batches_completed += 1,
        }
    }
    counts
}

pub fn capture_snapshot_system(
    clock: Res<SimulationClock>,
    mut snapshots: ResMut<SimSnapshots>,
    orders: Query<(&Order, &OrderLifecycle)>,
    drivers: Query<&Driver>,
    batches: Query<&BatchDispatch>,
) {
    if snapshots.capacity == 0 {
        return;
    }
    let now = clock.now();

    let mut order_rows: Vec<OrderSnapshot> = orders
        .iter()
        .map(|(order, lifecycle)| OrderSnapshot {
            id: order.id,
            status: lifecycle.status,
        })
        .collect();
    order_rows.sort_by_key(|row| row.id);

    let mut driver_rows: Vec<DriverSnapshot> = drivers
        .iter()
        .map(|driver| DriverSnapshot {
            id: driver.id,
            location: driver.location,
            cell: driver.location.cell().map(u64::from),
            state: driver.state_at(now),
        })
        .collect();
    driver_rows.sort_by_key(|row| row.id);

    let counts = count_states(
        order_rows.iter().map(|row| row.status),
        driver_rows.iter().map(|row| row.state),
        batches.iter(),
    );

    snapshots.push(SimSnapshot {
        tick: clock.tick(),
        now,
        counts,
        orders: order_rows,
        drivers: driver_rows,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::scenario::{build_scenario, populate_demand};
    use crate::test_helpers::single_order_params;

    #[test]
    fn captures_counts_for_every_entity() {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");

        let mut schedule = Schedule::default();
        schedule.add_systems(capture_snapshot_system);
        schedule.run(&mut world);

        let snapshots = world.resource::<SimSnapshots>();
        let latest = snapshots.latest().expect("snapshot");
        assert_eq!(latest.counts.total_orders(), 1);
        assert_eq!(latest.counts.orders_in(OrderStatus::Created), 1);
        assert_eq!(latest.counts.drivers_idle, 1);
        assert_eq!(latest.counts.batches_pending, 1);
        assert!(latest.drivers[0].cell.is_some());
    }

    #[test]
    fn batch_progress_is_counted() {
        let pending = BatchDispatch::default();
        let completed = BatchDispatch {
            assignment: None,
            completed_at: Some(3.0),
        };
        let counts = count_states([], [], [&pending, &completed]);
        assert_eq!(counts.batches_pending, 2);
    }
}
