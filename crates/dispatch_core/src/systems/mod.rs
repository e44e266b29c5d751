//! Per-tick systems, run in order by [`crate::runner::simulation_schedule`]:
//! assignment, progression, movement, completion, snapshot.

pub mod assignment;
pub mod completion;
pub mod movement;
pub mod progression;
pub mod telemetry_snapshot;

use bevy_ecs::prelude::Query;

use crate::dispatch::Assignment;
use crate::ecs::{Batch, BatchDispatch, BatchId, EntityIndex};

/// Assignment of a batch, if it has been dispatched.
pub(crate) fn assignment_for<'a>(
    index: &EntityIndex,
    batches: &'a Query<(&Batch, &BatchDispatch)>,
    batch_id: Option<BatchId>,
) -> Option<(&'a Batch, Option<&'a Assignment>)> {
    let entity = index.batches.get(&batch_id?)?;
    let (batch, dispatch) = batches.get(*entity).ok()?;
    Some((batch, dispatch.assignment.as_ref()))
}

#[cfg(test)]
mod end_to_end_tests {
    use bevy_ecs::prelude::World;

    use crate::ecs::{Driver, OrderLifecycle, OrderStatus};
    use crate::runner::{run_until_delivered, simulation_schedule};
    use crate::scenario::{build_scenario, populate_demand};
    use crate::telemetry::SimTelemetry;
    use crate::test_helpers::single_order_params;

    #[test]
    fn delivers_one_order_end_to_end() {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");

        let mut schedule = simulation_schedule();
        let ticks = run_until_delivered(&mut world, &mut schedule, 10_000).expect("run");
        assert!(ticks > 0);

        let lifecycle = world
            .query::<&OrderLifecycle>()
            .iter(&world)
            .next()
            .expect("order")
            .clone();
        assert_eq!(lifecycle.status, OrderStatus::Delivered);
        let statuses: Vec<OrderStatus> = lifecycle.history.iter().map(|c| c.status).collect();
        assert_eq!(statuses, OrderStatus::ALL.to_vec());

        let driver = world
            .query::<&Driver>()
            .iter(&world)
            .next()
            .expect("driver")
            .clone();
        assert!(driver.queue.is_empty());
        assert_eq!(driver.completed_batches, 1);
        assert!(driver.cumulative_earnings > 0.0);

        let telemetry = world.resource::<SimTelemetry>();
        assert_eq!(telemetry.deliveries.len(), 1);
        assert_eq!(telemetry.completed_batches.len(), 1);
        let record = telemetry.deliveries[0];
        assert!(record.created_at <= record.ready_at);
        assert!(record.ready_at <= record.picked_up_at);
        assert!(record.picked_up_at <= record.delivered_at);
        assert!(record.delivered_at >= record.eta);
    }
}
