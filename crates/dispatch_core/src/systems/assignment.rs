use bevy_ecs::prelude::{Query, Res, ResMut};
use tracing::error;

use crate::clock::SimulationClock;
use crate::dispatch::{DispatchScheduler, DriverSlot};
use crate::ecs::{Batch, BatchDispatch, Driver, EntityIndex, HubDirectory, OrderLifecycle, PendingBatches};
use crate::telemetry::{SimTelemetry, TickActivity};

/// Assign ready batches in creation order. A batch that is not ready yet
/// blocks every later batch, so assignments match the up-front plan.
#[allow(clippy::too_many_arguments)]
pub fn assignment_system(
    clock: Res<SimulationClock>,
    hubs: Res<HubDirectory>,
    scheduler: Res<DispatchScheduler>,
    index: Res<EntityIndex>,
    mut pending: ResMut<PendingBatches>,
    mut telemetry: ResMut<SimTelemetry>,
    mut activity: ResMut<TickActivity>,
    mut batches: Query<(&Batch, &mut BatchDispatch)>,
    mut drivers: Query<&mut Driver>,
    mut lifecycles: Query<&mut OrderLifecycle>,
) {
    let now = clock.now();
    let mut slots: Vec<DriverSlot> = drivers
        .iter()
        .map(|driver| DriverSlot {
            id: driver.id,
            location: driver.release_location,
            available_at: driver.available_at,
        })
        .collect();
    slots.sort_by_key(|slot| slot.id);

    while let Some(&batch_id) = pending.0.front() {
        let Some((batch, mut dispatch)) = index
            .batches
            .get(&batch_id)
            .and_then(|entity| batches.get_mut(*entity).ok())
        else {
            pending.0.pop_front();
            continue;
        };
        if now < batch.ready_at {
            break;
        }
        pending.0.pop_front();

        let assignment = match scheduler.assign(&mut slots, batch, &hubs, now) {
            Ok(assignment) => assignment,
            Err(err) => {
                error!(batch = batch_id.0, error = %err, "batch could not be dispatched");
                telemetry.failed_batches.push(batch_id);
                continue;
            }
        };

        if let Some(mut driver) = index
            .drivers
            .get(&assignment.driver_id)
            .and_then(|entity| drivers.get_mut(*entity).ok())
        {
            driver.available_at = assignment.finish_at;
            driver.release_location = assignment.release_location();
            driver.queue.push_back(batch.id);
            if driver.assigned_batch.is_none() {
                driver.assigned_batch = Some(batch.id);
            }
        }

        for order_id in &batch.order_ids {
            if let Some(mut lifecycle) = index
                .orders
                .get(order_id)
                .and_then(|entity| lifecycles.get_mut(*entity).ok())
            {
                lifecycle.driver_id = Some(assignment.driver_id);
                lifecycle.eta = assignment
                    .route
                    .leg_for_order(*order_id)
                    .map(|leg| leg.arrive_at);
            }
        }

        dispatch.assignment = Some(assignment);
        activity.assignments += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::ecs::{BatchId, DriverId};
    use crate::scenario::{build_scenario, populate_demand};
    use crate::test_helpers::single_order_params;

    fn world_with_one_batch() -> World {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");
        world
    }

    fn set_clock(world: &mut World, ticks: u64) {
        let mut clock = world.resource_mut::<SimulationClock>();
        for _ in 0..ticks {
            clock.advance();
        }
    }

    #[test]
    fn batch_waits_until_ready() {
        let mut world = world_with_one_batch();
        let mut schedule = Schedule::default();
        schedule.add_systems(assignment_system);

        schedule.run(&mut world);
        assert_eq!(world.resource::<PendingBatches>().0.len(), 1);
        assert_eq!(world.resource::<TickActivity>().assignments, 0);
    }

    #[test]
    fn ready_batch_is_assigned_and_driver_committed() {
        let mut world = world_with_one_batch();
        let ready_at = world
            .query::<&Batch>()
            .iter(&world)
            .next()
            .expect("batch")
            .ready_at;
        set_clock(&mut world, ready_at.ceil() as u64);

        let mut schedule = Schedule::default();
        schedule.add_systems(assignment_system);
        schedule.run(&mut world);

        assert!(world.resource::<PendingBatches>().0.is_empty());
        let dispatch = world
            .query::<&BatchDispatch>()
            .iter(&world)
            .next()
            .expect("dispatch")
            .clone();
        let assignment = dispatch.assignment.expect("assigned");
        assert_eq!(assignment.driver_id, DriverId(0));

        let driver = world.query::<&Driver>().iter(&world).next().expect("driver").clone();
        assert_eq!(driver.queue.front(), Some(&BatchId(0)));
        assert_eq!(driver.assigned_batch, Some(BatchId(0)));
        assert_eq!(driver.available_at, assignment.finish_at);

        let lifecycle = world
            .query::<&OrderLifecycle>()
            .iter(&world)
            .next()
            .expect("order")
            .clone();
        assert_eq!(lifecycle.driver_id, Some(DriverId(0)));
        assert!(lifecycle.eta.is_some());
    }
}
