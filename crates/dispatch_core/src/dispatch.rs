//! Earliest-start batch assignment over a fixed driver pool.
//!
//! Each batch, in creation order, goes to the driver for which
//! `max(available_at, start_floor)` is smallest; the first driver in pool
//! order wins ties. The start floor is the later of the batch's ready time
//! and the moment it is assigned, so no route departs before the decision
//! that created it. The driver departs at that time from its release
//! location, and its `available_at` and location move to the end of the
//! full route.

use bevy_ecs::prelude::Resource;
use tracing::{debug, error};

use crate::clock::SimulationClock;
use crate::ecs::{Batch, BatchId, DriverId, HubDirectory};
use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::routing::{build_dispatch_route, Route, RouteTiming};

/// Scheduler view of one driver: where and when it is next free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSlot {
    pub id: DriverId,
    pub location: Coordinate,
    pub available_at: f64,
}

/// One committed batch-to-driver assignment with its full timed route.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub batch_id: BatchId,
    pub driver_id: DriverId,
    pub ready_at: f64,
    /// Simulated time at which the scheduler committed the driver.
    pub assigned_at: f64,
    pub previous_available_at: f64,
    pub depart_at: f64,
    pub hub_arrival_at: f64,
    pub hub_departure_at: f64,
    pub finish_at: f64,
    pub route: Route,
}

impl Assignment {
    pub fn route_km(&self) -> f64 {
        self.route.total_km()
    }

    /// Time the driver waited for the batch to become ready.
    pub fn idle_wait(&self) -> f64 {
        (self.ready_at - self.previous_available_at).max(0.0)
    }

    pub fn release_location(&self) -> Coordinate {
        self.route
            .legs
            .last()
            .map(|leg| leg.to)
            .unwrap_or_default()
    }
}

/// Index of the slot that can start soonest. `None` for an empty pool.
pub fn select_driver(slots: &[DriverSlot], start_floor: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, slot) in slots.iter().enumerate() {
        let start = slot.available_at.max(start_floor);
        if best.map_or(true, |(_, best_start)| start < best_start) {
            best = Some((i, start));
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Debug, Clone, Copy, Resource)]
pub struct DispatchScheduler {
    pub timing: RouteTiming,
}

impl DispatchScheduler {
    pub fn new(timing: RouteTiming) -> Self {
        Self { timing }
    }

    /// Assign `batch` at simulated time `assigned_at` and update the chosen
    /// slot in place.
    pub fn assign(
        &self,
        slots: &mut [DriverSlot],
        batch: &Batch,
        hubs: &HubDirectory,
        assigned_at: f64,
    ) -> Result<Assignment, DispatchError> {
        let hub = hubs.get(batch.hub_id).ok_or(DispatchError::UnknownHub {
            batch: batch.id,
            hub: batch.hub_id,
        })?;
        let start_floor = batch.ready_at.max(assigned_at);
        let index = select_driver(slots, start_floor).ok_or_else(|| DispatchError::EmptyPool {
            batch_ids: vec![batch.id],
        })?;

        let slot = &mut slots[index];
        let depart_at = slot.available_at.max(start_floor);
        let route = build_dispatch_route(&batch.route, &self.timing, hub, slot.location, depart_at);
        let assignment = Assignment {
            batch_id: batch.id,
            driver_id: slot.id,
            ready_at: batch.ready_at,
            assigned_at,
            previous_available_at: slot.available_at,
            depart_at,
            hub_arrival_at: route.hub_arrival().unwrap_or(depart_at),
            hub_departure_at: route.hub_departure(),
            finish_at: route.finish_at,
            route,
        };

        slot.available_at = assignment.finish_at;
        slot.location = assignment.release_location();

        debug!(
            batch = batch.id.0,
            driver = assignment.driver_id.0,
            ready_at = assignment.ready_at,
            depart_at = assignment.depart_at,
            finish_at = assignment.finish_at,
            route_km = assignment.route_km(),
            "batch assigned"
        );
        Ok(assignment)
    }
}

/// Result of scheduling every batch up front.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan {
    /// In batch order.
    pub assignments: Vec<Assignment>,
    /// Final slot state per driver, in pool order.
    pub drivers: Vec<DriverSlot>,
}

/// Time at which a ticking run assigns each batch: the first tick at or
/// after its ready time, never before the batch ahead of it in creation order.
pub fn assignment_times(batches: &[Batch], tick_minutes: f64) -> Vec<f64> {
    let mut previous = 0.0_f64;
    batches
        .iter()
        .map(|batch| {
            previous = previous.max(SimulationClock::first_tick_at_or_after(
                tick_minutes,
                batch.ready_at,
            ));
            previous
        })
        .collect()
}

/// Schedule `batches` in the order given (creation order) against `slots`,
/// assigning each at the tick a ticking run would. An empty pool fails with
/// every batch id listed.
pub fn plan_dispatch(
    scheduler: &DispatchScheduler,
    batches: &[Batch],
    hubs: &HubDirectory,
    mut slots: Vec<DriverSlot>,
    tick_minutes: f64,
) -> Result<DispatchPlan, DispatchError> {
    if slots.is_empty() && !batches.is_empty() {
        let batch_ids: Vec<BatchId> = batches.iter().map(|batch| batch.id).collect();
        error!(batches = batch_ids.len(), "no drivers available; dispatch aborted");
        return Err(DispatchError::EmptyPool { batch_ids });
    }

    let mut assignments = Vec::with_capacity(batches.len());
    for (batch, assigned_at) in batches.iter().zip(assignment_times(batches, tick_minutes)) {
        assignments.push(scheduler.assign(&mut slots, batch, hubs, assigned_at)?);
    }
    Ok(DispatchPlan {
        assignments,
        drivers: slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Hub, HubId, OrderId};
    use crate::geo::{destination_point, distance_km};
    use crate::routing::{build_batch_route, NearestNeighborPlanner};

    const HUB: Coordinate = Coordinate::new(52.52, 13.405);

    fn timing() -> RouteTiming {
        RouteTiming {
            speed_kmh: 30.0,
            pickup_minutes: 3.0,
            dropoff_minutes: 2.0,
        }
    }

    fn hubs() -> HubDirectory {
        HubDirectory(vec![Hub {
            id: HubId(0),
            name: "hub".into(),
            coordinate: HUB,
            max_delivery_km: 6.0,
            prep_minutes: 10.0,
        }])
    }

    fn batch(id: u32, ready_at: f64, km: f64) -> Batch {
        let hubs = hubs();
        let customer = destination_point(HUB, 0.0, km);
        let route = build_batch_route(
            &NearestNeighborPlanner,
            &timing(),
            &hubs.0[0],
            &[(OrderId(id), customer)],
        );
        Batch {
            id: BatchId(id),
            hub_id: HubId(0),
            created_at: ready_at - 10.0,
            ready_at,
            order_ids: vec![OrderId(id)],
            route,
        }
    }

    fn slot(id: u32, available_at: f64) -> DriverSlot {
        DriverSlot {
            id: DriverId(id),
            location: HUB,
            available_at,
        }
    }

    #[test]
    fn selects_earliest_start_with_first_slot_on_ties() {
        let slots = [slot(0, 20.0), slot(1, 5.0), slot(2, 5.0)];
        assert_eq!(select_driver(&slots, 0.0), Some(1));
        // Everyone can start at ready time: first in pool order wins.
        assert_eq!(select_driver(&slots, 30.0), Some(0));
        assert_eq!(select_driver(&[], 0.0), None);
    }

    #[test]
    fn assignment_advances_slot_to_route_end() {
        let scheduler = DispatchScheduler::new(timing());
        let mut slots = vec![slot(0, 0.0)];
        let batch = batch(0, 10.0, 2.0);
        let assignment = scheduler.assign(&mut slots, &batch, &hubs(), 10.0).expect("assign");

        assert_eq!(assignment.depart_at, 10.0);
        // zero approach, 3 pickup, 4 driving, 2 drop-off
        assert!((assignment.finish_at - 19.0).abs() < 1e-6);
        assert_eq!(slots[0].available_at, assignment.finish_at);
        assert!((distance_km(slots[0].location, destination_point(HUB, 0.0, 2.0))) < 1e-9);
        assert!(
            (slots[0].available_at - assignment.depart_at - assignment.route.total_minutes()).abs()
                < 1e-9
        );
    }

    #[test]
    fn busy_driver_departs_when_free() {
        let scheduler = DispatchScheduler::new(timing());
        let mut slots = vec![slot(0, 40.0)];
        let assignment = scheduler
            .assign(&mut slots, &batch(0, 10.0, 1.0), &hubs(), 10.0)
            .expect("assign");
        assert_eq!(assignment.depart_at, 40.0);
        assert_eq!(assignment.idle_wait(), 0.0);
    }

    #[test]
    fn late_assignment_never_departs_in_the_past() {
        let scheduler = DispatchScheduler::new(timing());
        let mut slots = vec![slot(0, 0.0)];
        let assignment = scheduler
            .assign(&mut slots, &batch(0, 16.0, 1.0), &hubs(), 40.0)
            .expect("assign");
        assert_eq!(assignment.assigned_at, 40.0);
        assert_eq!(assignment.depart_at, 40.0);
    }

    #[test]
    fn assignment_times_follow_creation_order_on_tick_boundaries() {
        // A slow batch ahead in creation order holds back a faster one.
        let batches = vec![batch(0, 40.0, 1.0), batch(1, 16.0, 1.0), batch(2, 41.5, 1.0)];
        assert_eq!(assignment_times(&batches, 1.0), vec![40.0, 40.0, 42.0]);

        let scheduler = DispatchScheduler::new(timing());
        let slots = vec![slot(0, 0.0), slot(1, 0.0)];
        let plan = plan_dispatch(&scheduler, &batches, &hubs(), slots, 1.0).expect("plan");
        for assignment in &plan.assignments {
            assert!(assignment.depart_at >= assignment.assigned_at);
            assert!(assignment.assigned_at >= assignment.ready_at);
        }
    }

    #[test]
    fn empty_pool_reports_every_batch() {
        let scheduler = DispatchScheduler::new(timing());
        let batches = vec![batch(0, 10.0, 1.0), batch(1, 12.0, 1.0)];
        let err = plan_dispatch(&scheduler, &batches, &hubs(), Vec::new(), 1.0).unwrap_err();
        assert_eq!(
            err,
            DispatchError::EmptyPool {
                batch_ids: vec![BatchId(0), BatchId(1)]
            }
        );
    }

    #[test]
    fn unknown_hub_is_an_error() {
        let scheduler = DispatchScheduler::new(timing());
        let mut orphan = batch(0, 10.0, 1.0);
        orphan.hub_id = HubId(9);
        let err = scheduler
            .assign(&mut [slot(0, 0.0)], &orphan, &hubs(), 10.0)
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownHub { .. }));
    }

    #[test]
    fn plan_keeps_each_driver_monotonic() {
        let scheduler = DispatchScheduler::new(timing());
        let batches: Vec<Batch> = (0..8).map(|i| batch(i, 5.0 + i as f64 * 2.0, 1.5)).collect();
        let plan = plan_dispatch(
            &scheduler,
            &batches,
            &hubs(),
            vec![slot(0, 0.0), slot(1, 0.0)],
            1.0,
        )
        .expect("plan");
        assert_eq!(plan.assignments.len(), 8);
        for driver in [DriverId(0), DriverId(1)] {
            let mut last = 0.0;
            for assignment in plan.assignments.iter().filter(|a| a.driver_id == driver) {
                assert!(assignment.depart_at >= last);
                assert!(assignment.finish_at >= assignment.depart_at);
                last = assignment.finish_at;
            }
        }
    }
}
