use bevy_ecs::prelude::{Query, Res, ResMut};
use tracing::debug;

use crate::clock::SimulationClock;
use crate::ecs::{Batch, BatchDispatch, Driver, EntityIndex, Order, OrderLifecycle, OrderStatus};
use crate::pricing::{settle_batch, PricingConfig};
use crate::telemetry::{CompletedBatchRecord, DeliveryRecord, SimTelemetry, TickActivity};

/// Deliver orders whose drop-off leg has been fully travelled, then release
/// drivers whose current batch is finished and fully delivered.
#[allow(clippy::too_many_arguments)]
pub fn completion_system(
    clock: Res<SimulationClock>,
    pricing: Res<PricingConfig>,
    index: Res<EntityIndex>,
    mut telemetry: ResMut<SimTelemetry>,
    mut activity: ResMut<TickActivity>,
    mut batches: Query<(&Batch, &mut BatchDispatch)>,
    mut orders: Query<(&Order, &mut OrderLifecycle)>,
    mut drivers: Query<&mut Driver>,
) {
    let now = clock.now();
    let tick = clock.tick();

    for (order, mut lifecycle) in orders.iter_mut() {
        if lifecycle.status != OrderStatus::EnRoute || lifecycle.stepped_in(tick) {
            continue;
        }
        let Some((batch, dispatch)) = lifecycle
            .batch_id
            .and_then(|id| index.batches.get(&id))
            .and_then(|entity| batches.get(*entity).ok())
        else {
            continue;
        };
        let Some(assignment) = dispatch.assignment.as_ref() else {
            continue;
        };
        let Some(leg) = assignment.route.leg_for_order(order.id) else {
            continue;
        };
        let fraction = if leg.duration_min > 0.0 {
            (now - leg.depart_at) / leg.duration_min
        } else {
            1.0
        };
        if fraction < 1.0 {
            continue;
        }

        lifecycle.advance(now, tick);
        telemetry.deliveries.push(DeliveryRecord {
            order_id: order.id,
            batch_id: batch.id,
            driver_id: assignment.driver_id,
            created_at: order.created_at,
            ready_at: batch.ready_at,
            picked_up_at: lifecycle.reached_at(OrderStatus::PickedUp).unwrap_or(now),
            delivered_at: now,
            eta: leg.arrive_at,
        });
        activity.deliveries += 1;
    }

    for mut driver in drivers.iter_mut() {
        while let Some(batch_id) = driver.queue.front().copied() {
            let Some(entity) = index.batches.get(&batch_id).copied() else {
                driver.queue.pop_front();
                continue;
            };
            let Ok((batch, mut dispatch)) = batches.get_mut(entity) else {
                driver.queue.pop_front();
                continue;
            };
            let Some(assignment) = dispatch.assignment.clone() else {
                break;
            };
            if now < assignment.finish_at {
                break;
            }

            let mut values = Vec::with_capacity(batch.order_ids.len());
            let mut delivered = true;
            for order_id in &batch.order_ids {
                if let Some((order, lifecycle)) = index
                    .orders
                    .get(order_id)
                    .and_then(|entity| orders.get(*entity).ok())
                {
                    delivered &= lifecycle.status.is_terminal();
                    values.push(order.value);
                }
            }
            if !delivered {
                break;
            }

            let economics = settle_batch(
                &pricing,
                batch.id,
                driver.id,
                &values,
                assignment.route_km(),
            );
            driver.location = assignment.release_location();
            driver.cumulative_km += economics.route_km;
            driver.cumulative_earnings += economics.driver_pay;
            driver.completed_batches += 1;
            driver.queue.pop_front();
            driver.assigned_batch = driver.queue.front().copied();
            dispatch.completed_at = Some(now);

            debug!(
                batch = batch.id.0,
                driver = driver.id.0,
                driver_pay = economics.driver_pay,
                margin = economics.delivery_margin,
                "batch completed"
            );
            telemetry.completed_batches.push(CompletedBatchRecord {
                batch_id: batch.id,
                driver_id: driver.id,
                depart_at: assignment.depart_at,
                finish_at: assignment.finish_at,
                completed_at: now,
                economics,
            });
            activity.completed_batches += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::World;

    use crate::runner::{run_next_tick, simulation_schedule};
    use crate::scenario::{build_scenario, populate_demand};
    use crate::test_helpers::single_order_params;

    #[test]
    fn driver_is_released_only_after_finish_and_delivery() {
        let mut world = World::new();
        build_scenario(&mut world, &single_order_params()).expect("scenario");
        populate_demand(&mut world).expect("demand");
        let mut schedule = simulation_schedule();

        let mut released_at = None;
        for _ in 0..500 {
            run_next_tick(&mut world, &mut schedule);
            if world.resource::<TickActivity>().completed_batches > 0 {
                released_at = Some(world.resource::<SimulationClock>().now());
                break;
            }
        }
        let released_at = released_at.expect("batch completed");

        let telemetry = world.resource::<SimTelemetry>();
        let record = telemetry.completed_batches[0];
        assert!(released_at >= record.finish_at);
        assert!(telemetry.deliveries[0].delivered_at <= released_at);

        let driver = world.query::<&Driver>().iter(&world).next().expect("driver").clone();
        assert_eq!(driver.assigned_batch, None);
        assert!((driver.cumulative_km - record.economics.route_km).abs() < 1e-12);
        assert!((driver.cumulative_earnings - record.economics.driver_pay).abs() < 1e-12);
    }
}
