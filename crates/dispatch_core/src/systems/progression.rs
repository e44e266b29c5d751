use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::ecs::{Batch, BatchDispatch, EntityIndex, Order, OrderLifecycle, OrderStatus};
use crate::scenario::ScenarioParams;
use crate::telemetry::TickActivity;

use super::assignment_for;

/// Move each order at most one status per tick, up to `EnRoute`. Orders are
/// picked up when the driver reaches the hub and go en route when their own
/// drop-off leg departs. Delivery is decided by the completion system.
pub fn progression_system(
    clock: Res<SimulationClock>,
    params: Res<ScenarioParams>,
    index: Res<EntityIndex>,
    mut activity: ResMut<TickActivity>,
    batches: Query<(&Batch, &BatchDispatch)>,
    mut orders: Query<(&Order, &mut OrderLifecycle)>,
) {
    let now = clock.now();
    let tick = clock.tick();

    for (order, mut lifecycle) in orders.iter_mut() {
        if lifecycle.stepped_in(tick) {
            continue;
        }
        let accepted_at = order.created_at + params.accept_minutes;
        let batch = assignment_for(&index, &batches, lifecycle.batch_id);

        let due = match lifecycle.status {
            OrderStatus::Created => now >= accepted_at,
            OrderStatus::Accepted => true,
            OrderStatus::Preparing => {
                batch.is_some_and(|(batch, _)| now >= batch.ready_at.max(accepted_at))
            }
            OrderStatus::Ready => batch
                .and_then(|(_, assignment)| assignment)
                .is_some_and(|assignment| now >= assignment.hub_arrival_at),
            OrderStatus::PickedUp => batch
                .and_then(|(_, assignment)| assignment)
                .and_then(|assignment| assignment.route.leg_for_order(order.id))
                .is_some_and(|leg| now >= leg.depart_at),
            OrderStatus::EnRoute | OrderStatus::Delivered => false,
        };

        if due && lifecycle.advance(now, tick).is_some() {
            activity.transitions += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::scenario::{build_scenario, populate_demand};
    use crate::test_helpers::single_order_params;

    fn run_ticks(world: &mut World, schedule: &mut Schedule, ticks: usize) {
        for _ in 0..ticks {
            world.resource_mut::<SimulationClock>().advance();
            schedule.run(world);
        }
    }

    fn status(world: &mut World) -> OrderStatus {
        world
            .query::<&OrderLifecycle>()
            .iter(world)
            .next()
            .expect("order")
            .status
    }

    #[test]
    fn unassigned_order_stops_at_ready() {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");

        let mut schedule = Schedule::default();
        schedule.add_systems(progression_system);
        run_ticks(&mut world, &mut schedule, 200);

        assert_eq!(status(&mut world), OrderStatus::Ready);
    }

    #[test]
    fn one_step_per_tick() {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");

        let mut schedule = Schedule::default();
        schedule.add_systems(progression_system);
        run_ticks(&mut world, &mut schedule, 200);

        let lifecycle = world
            .query::<&OrderLifecycle>()
            .iter(&world)
            .next()
            .expect("order")
            .clone();
        let ticks: Vec<u64> = lifecycle.history.iter().map(|change| change.tick).collect();
        for pair in ticks.windows(2) {
            assert!(pair[0] < pair[1], "two steps in one tick: {ticks:?}");
        }
    }
}
