//! Simulation runner: advances the clock and runs the tick schedule.
//!
//! Clock progression happens here, outside systems. Each step advances
//! [`SimulationClock`] by one tick, resets [`TickActivity`] and runs the
//! chained systems once.

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use tracing::{debug, info};

use crate::clock::SimulationClock;
use crate::ecs::{BatchDispatch, Driver, OrderLifecycle, PendingBatches};
use crate::error::{SimError, SimResult};
use crate::systems::{
    assignment::assignment_system, completion::completion_system, movement::movement_system,
    progression::progression_system, telemetry_snapshot::capture_snapshot_system,
};
use crate::telemetry::TickActivity;

pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            assignment_system,
            progression_system,
            movement_system,
            completion_system,
            capture_snapshot_system,
        )
            .chain(),
    );
    schedule
}

/// True once every order is delivered, no batch is waiting for a driver,
/// every dispatched batch is settled and no driver has unfinished work.
pub fn is_run_complete(world: &mut World) -> bool {
    let delivered = world
        .query::<&OrderLifecycle>()
        .iter(world)
        .all(|lifecycle| lifecycle.status.is_terminal());
    let nothing_pending = world
        .get_resource::<PendingBatches>()
        .map_or(true, |pending| pending.0.is_empty());
    delivered
        && nothing_pending
        && world
            .query::<&BatchDispatch>()
            .iter(world)
            .all(|dispatch| dispatch.assignment.is_none() || dispatch.completed_at.is_some())
        && world
            .query::<&Driver>()
            .iter(world)
            .all(|driver| driver.queue.is_empty())
}

/// Advance one tick and run the schedule. Returns `false` without advancing
/// when the run is already complete.
pub fn run_next_tick(world: &mut World, schedule: &mut Schedule) -> bool {
    if is_run_complete(world) {
        return false;
    }
    let now = world.resource_mut::<SimulationClock>().advance();
    *world.resource_mut::<TickActivity>() = TickActivity::default();
    schedule.run(world);

    let activity = *world.resource::<TickActivity>();
    if activity != TickActivity::default() {
        debug!(
            now,
            assignments = activity.assignments,
            transitions = activity.transitions,
            deliveries = activity.deliveries,
            completed_batches = activity.completed_batches,
            "tick"
        );
    }
    true
}

/// Tick until the run completes. Fails when `max_ticks` is reached first.
pub fn run_until_delivered(
    world: &mut World,
    schedule: &mut Schedule,
    max_ticks: usize,
) -> SimResult<usize> {
    let mut ticks = 0;
    while ticks < max_ticks {
        if !run_next_tick(world, schedule) {
            let now = world.resource::<SimulationClock>().now();
            info!(ticks, now, "run complete");
            return Ok(ticks);
        }
        ticks += 1;
    }
    if is_run_complete(world) {
        return Ok(ticks);
    }
    Err(SimError::TickBudgetExhausted { max_ticks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{build_scenario, populate_demand};
    use crate::test_helpers::single_order_params;

    #[test]
    fn completed_run_does_not_advance_the_clock() {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");
        let mut schedule = simulation_schedule();

        let ticks = run_until_delivered(&mut world, &mut schedule, 10_000).expect("run");
        let tick = world.resource::<SimulationClock>().tick();
        assert_eq!(tick, ticks as u64);
        assert!(!run_next_tick(&mut world, &mut schedule));
        assert_eq!(world.resource::<SimulationClock>().tick(), tick);
    }

    #[test]
    fn delivered_orders_do_not_end_a_run_with_undispatched_batches() {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");
        for mut lifecycle in world.query::<&mut OrderLifecycle>().iter_mut(&mut world) {
            while lifecycle.advance(0.0, 0).is_some() {}
        }
        assert!(!is_run_complete(&mut world));

        let mut schedule = simulation_schedule();
        run_until_delivered(&mut world, &mut schedule, 10_000).expect("run");
        assert!(world.resource::<PendingBatches>().0.is_empty());
        let dispatch = world
            .query::<&BatchDispatch>()
            .iter(&world)
            .next()
            .expect("batch")
            .clone();
        assert!(dispatch.assignment.is_some());
        assert!(dispatch.completed_at.is_some());
    }

    #[test]
    fn tick_budget_is_enforced() {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");
        let mut schedule = simulation_schedule();

        let err = run_until_delivered(&mut world, &mut schedule, 3).unwrap_err();
        assert!(matches!(err, SimError::TickBudgetExhausted { max_ticks: 3 }));
    }
}
