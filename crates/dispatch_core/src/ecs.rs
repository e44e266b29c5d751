use std::collections::{HashMap, VecDeque};

use bevy_ecs::prelude::{Component, Entity, Resource};
use serde::{Deserialize, Serialize};

use crate::dispatch::Assignment;
use crate::geo::Coordinate;
use crate::routing::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HubId(pub u32);

/// Fixed order lifecycle. Variants are declared in lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Created,
    Accepted,
    Preparing,
    Ready,
    PickedUp,
    EnRoute,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Created,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::PickedUp,
        OrderStatus::EnRoute,
        OrderStatus::Delivered,
    ];

    /// The status that follows this one, or `None` once delivered.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Created => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::PickedUp),
            OrderStatus::PickedUp => Some(OrderStatus::EnRoute),
            OrderStatus::EnRoute => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Delivered
    }

    /// Position in [`OrderStatus::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Pickup hub, resolved from configuration with global defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hub {
    pub id: HubId,
    pub name: String,
    pub coordinate: Coordinate,
    /// Maximum customer distance from this hub.
    pub max_delivery_km: f64,
    /// Average preparation time for a batch at this hub.
    pub prep_minutes: f64,
}

/// Hubs in configuration order; `HubId(i)` is the i-th entry.
#[derive(Debug, Clone, Default, Resource)]
pub struct HubDirectory(pub Vec<Hub>);

impl HubDirectory {
    pub fn get(&self, id: HubId) -> Option<&Hub> {
        self.0.get(id.0 as usize).filter(|hub| hub.id == id)
    }
}

/// A generated order. Immutable after generation; the mutable lifecycle
/// lives in [`OrderLifecycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Component)]
pub struct Order {
    pub id: OrderId,
    pub hub_id: HubId,
    pub customer: Coordinate,
    /// Simulated minutes since run start.
    pub created_at: f64,
    pub value: f64,
    pub distance_from_hub_km: f64,
    /// Set when sampling exhausted its retries and the order was placed at the hub.
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub at: f64,
    /// Tick during which the change happened; 0 before the first tick.
    pub tick: u64,
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct OrderLifecycle {
    pub status: OrderStatus,
    pub batch_id: Option<BatchId>,
    pub driver_id: Option<DriverId>,
    /// Projected drop-off arrival, known once the batch is assigned.
    pub eta: Option<f64>,
    pub history: Vec<StatusChange>,
}

impl OrderLifecycle {
    pub fn new(created_at: f64) -> Self {
        Self {
            status: OrderStatus::Created,
            batch_id: None,
            driver_id: None,
            eta: None,
            history: vec![StatusChange {
                status: OrderStatus::Created,
                at: created_at,
                tick: 0,
            }],
        }
    }

    /// Move exactly one status forward. Returns the new status, or `None`
    /// when the order is already delivered.
    pub fn advance(&mut self, at: f64, tick: u64) -> Option<OrderStatus> {
        let next = self.status.next()?;
        self.status = next;
        self.history.push(StatusChange {
            status: next,
            at,
            tick,
        });
        Some(next)
    }

    /// True when the order already moved during `tick`.
    pub fn stepped_in(&self, tick: u64) -> bool {
        self.history
            .last()
            .is_some_and(|change| change.tick == tick && change.status != OrderStatus::Created)
    }

    pub fn reached_at(&self, status: OrderStatus) -> Option<f64> {
        self.history
            .iter()
            .find(|change| change.status == status)
            .map(|change| change.at)
    }
}

/// Orders from one hub clustered for a single dispatch. Membership is fixed
/// once created. `route` holds the in-batch legs timed relative to hub
/// departure at minute 0.
#[derive(Debug, Clone, PartialEq, Serialize, Component)]
pub struct Batch {
    pub id: BatchId,
    pub hub_id: HubId,
    pub created_at: f64,
    pub ready_at: f64,
    pub order_ids: Vec<OrderId>,
    pub route: Route,
}

/// Dispatch state of a batch entity.
#[derive(Debug, Clone, Default, PartialEq, Component)]
pub struct BatchDispatch {
    pub assignment: Option<Assignment>,
    pub completed_at: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DriverState {
    Idle,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Driver {
    pub id: DriverId,
    /// Live position; interpolated while a route is active.
    pub location: Coordinate,
    /// When the driver finishes every batch committed to it so far.
    pub available_at: f64,
    /// Where the driver will be at `available_at`.
    pub release_location: Coordinate,
    pub assigned_batch: Option<BatchId>,
    /// Committed batches not yet finished, in assignment order.
    pub queue: VecDeque<BatchId>,
    pub cumulative_km: f64,
    pub cumulative_earnings: f64,
    pub completed_batches: u32,
}

impl Driver {
    pub fn new(id: DriverId, start: Coordinate, start_at: f64) -> Self {
        Self {
            id,
            location: start,
            available_at: start_at,
            release_location: start,
            assigned_batch: None,
            queue: VecDeque::new(),
            cumulative_km: 0.0,
            cumulative_earnings: 0.0,
            completed_batches: 0,
        }
    }

    /// Busy while any committed batch is unfinished.
    pub fn state_at(&self, now: f64) -> DriverState {
        if self.available_at > now || !self.queue.is_empty() {
            DriverState::Busy
        } else {
            DriverState::Idle
        }
    }
}

/// Lookup from domain ids to entities.
#[derive(Debug, Default, Resource)]
pub struct EntityIndex {
    pub orders: HashMap<OrderId, Entity>,
    pub batches: HashMap<BatchId, Entity>,
    pub drivers: HashMap<DriverId, Entity>,
}

/// Batches not yet assigned, in creation order.
#[derive(Debug, Default, Resource)]
pub struct PendingBatches(pub VecDeque<BatchId>);
