use bevy_ecs::prelude::{Query, Res};

use crate::clock::SimulationClock;
use crate::ecs::{BatchDispatch, Driver, EntityIndex};

/// Interpolate each busy driver along its active route: the latest queued
/// assignment that has already departed, or the first one while waiting.
pub fn movement_system(
    clock: Res<SimulationClock>,
    index: Res<EntityIndex>,
    batches: Query<&BatchDispatch>,
    mut drivers: Query<&mut Driver>,
) {
    let now = clock.now();
    for mut driver in drivers.iter_mut() {
        let mut active = None;
        for batch_id in &driver.queue {
            let Some(assignment) = index
                .batches
                .get(batch_id)
                .and_then(|entity| batches.get(*entity).ok())
                .and_then(|dispatch| dispatch.assignment.as_ref())
            else {
                continue;
            };
            if active.is_none() || assignment.depart_at <= now {
                active = Some(assignment);
            }
        }
        let position = active.and_then(|assignment| assignment.route.position_at(now));
        if let Some(position) = position {
            if driver.location != position {
                driver.location = position;
            }
        }
    }
}
