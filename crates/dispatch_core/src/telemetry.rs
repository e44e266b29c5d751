//! Telemetry: delivery records, settled batches and per-tick snapshots.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::ecs::{BatchId, DriverId, DriverState, OrderId, OrderStatus};
use crate::geo::Coordinate;
use crate::pricing::BatchEconomics;

/// One delivered order. Times are simulated minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub order_id: OrderId,
    pub batch_id: BatchId,
    pub driver_id: DriverId,
    pub created_at: f64,
    pub ready_at: f64,
    pub picked_up_at: f64,
    pub delivered_at: f64,
    /// Projected drop-off arrival from the dispatch route.
    pub eta: f64,
}

impl DeliveryRecord {
    /// Creation to drop-off.
    pub fn delivery_minutes(&self) -> f64 {
        self.delivered_at - self.created_at
    }

    /// Ready at the hub to picked up by the driver.
    pub fn pickup_wait(&self) -> f64 {
        (self.picked_up_at - self.ready_at).max(0.0)
    }

    pub fn lateness(&self) -> f64 {
        self.delivered_at - self.eta
    }
}

/// A batch whose driver finished the full route and was paid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedBatchRecord {
    pub batch_id: BatchId,
    pub driver_id: DriverId,
    pub depart_at: f64,
    pub finish_at: f64,
    pub completed_at: f64,
    pub economics: BatchEconomics,
}

/// A manual status advance that was refused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedAdvance {
    pub order_id: OrderId,
    /// `None` when the order does not exist.
    pub status: Option<OrderStatus>,
    pub at: f64,
}

#[derive(Debug, Default, Resource)]
pub struct SimTelemetry {
    pub deliveries: Vec<DeliveryRecord>,
    pub completed_batches: Vec<CompletedBatchRecord>,
    /// Batches that could not acquire a driver.
    pub failed_batches: Vec<BatchId>,
    pub rejected_advances: Vec<RejectedAdvance>,
    /// Orders placed at their hub after sampling ran out of attempts.
    pub sampling_fallbacks: usize,
}

/// What happened during the most recent tick. Reset by the runner before
/// each schedule run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Resource)]
#[serde(rename_all = "camelCase")]
pub struct TickActivity {
    pub assignments: usize,
    pub transitions: usize,
    pub deliveries: usize,
    pub completed_batches: usize,
}

/// Status counts at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimCounts {
    /// Indexed by [`OrderStatus::index`].
    pub orders_by_status: [usize; 7],
    pub drivers_idle: usize,
    pub drivers_busy: usize,
    pub batches_pending: usize,
    pub batches_assigned: usize,
    pub batches_completed: usize,
}

impl SimCounts {
    pub fn add_order(&mut self, status: OrderStatus) {
        self.orders_by_status[status.index()] += 1;
    }

    pub fn add_driver(&mut self, state: DriverState) {
        match state {
            DriverState::Idle => self.drivers_idle += 1,
            DriverState::Busy => self.drivers_busy += 1,
        }
    }

    pub fn orders_in(&self, status: OrderStatus) -> usize {
        self.orders_by_status[status.index()]
    }

    pub fn total_orders(&self) -> usize {
        self.orders_by_status.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub id: OrderId,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSnapshot {
    pub id: DriverId,
    pub location: Coordinate,
    /// H3 resolution-9 cell of `location`.
    pub cell: Option<u64>,
    pub state: DriverState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimSnapshot {
    pub tick: u64,
    pub now: f64,
    pub counts: SimCounts,
    pub orders: Vec<OrderSnapshot>,
    pub drivers: Vec<DriverSnapshot>,
}

/// Rolling snapshot buffer; the oldest snapshot is dropped once full.
#[derive(Debug, Default, Resource)]
pub struct SimSnapshots {
    pub capacity: usize,
    pub snapshots: VecDeque<SimSnapshot>,
}

impl SimSnapshots {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            snapshots: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn push(&mut self, snapshot: SimSnapshot) {
        if self.capacity == 0 {
            return;
        }
        while self.snapshots.len() >= self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    pub fn latest(&self) -> Option<&SimSnapshot> {
        self.snapshots.back()
    }
}
