use serde::Serialize;

use crate::ecs::{Hub, HubId, OrderId};
use crate::geo::{distance_km, Coordinate};

use super::planner::RoutePlanner;

/// Travel speed and dwell times used to time a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTiming {
    pub speed_kmh: f64,
    /// Dwell at the hub between arrival and departure with the batch.
    pub pickup_minutes: f64,
    /// Dwell after every drop-off, including the last one.
    pub dropoff_minutes: f64,
}

impl RouteTiming {
    pub fn travel_minutes(&self, km: f64) -> f64 {
        km / self.speed_kmh * 60.0
    }
}

/// Destination of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Stop {
    Hub(HubId),
    Customer(OrderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub from: Coordinate,
    pub to: Coordinate,
    pub stop: Stop,
    pub distance_km: f64,
    pub duration_min: f64,
    pub depart_at: f64,
    pub arrive_at: f64,
}

/// Timed sequence of legs. `finish_at` includes the final drop-off dwell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub legs: Vec<RouteLeg>,
    pub depart_at: f64,
    pub finish_at: f64,
}

impl Route {
    pub fn total_km(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_km).sum()
    }

    pub fn total_minutes(&self) -> f64 {
        self.finish_at - self.depart_at
    }

    /// Customer stops in visiting order.
    pub fn visit_order(&self) -> Vec<OrderId> {
        self.legs
            .iter()
            .filter_map(|leg| match leg.stop {
                Stop::Customer(id) => Some(id),
                Stop::Hub(_) => None,
            })
            .collect()
    }

    pub fn leg_for_order(&self, order: OrderId) -> Option<&RouteLeg> {
        self.legs
            .iter()
            .find(|leg| leg.stop == Stop::Customer(order))
    }

    pub fn hub_arrival(&self) -> Option<f64> {
        self.legs
            .iter()
            .find(|leg| matches!(leg.stop, Stop::Hub(_)))
            .map(|leg| leg.arrive_at)
    }

    /// When the driver leaves the hub with the batch.
    pub fn hub_departure(&self) -> f64 {
        self.legs
            .iter()
            .find(|leg| matches!(leg.stop, Stop::Customer(_)))
            .map(|leg| leg.depart_at)
            .unwrap_or(self.finish_at)
    }

    /// Same route with every timestamp moved by `offset` minutes.
    pub fn shifted(&self, offset: f64) -> Route {
        Route {
            legs: self
                .legs
                .iter()
                .map(|leg| RouteLeg {
                    depart_at: leg.depart_at + offset,
                    arrive_at: leg.arrive_at + offset,
                    ..*leg
                })
                .collect(),
            depart_at: self.depart_at + offset,
            finish_at: self.finish_at + offset,
        }
    }

    /// Interpolated position at time `t`. Stationary before departure, during
    /// dwells and after the last leg. `None` for a route without legs.
    pub fn position_at(&self, t: f64) -> Option<Coordinate> {
        let first = self.legs.first()?;
        if t <= first.depart_at {
            return Some(first.from);
        }
        for leg in &self.legs {
            if t < leg.depart_at {
                return Some(leg.from);
            }
            if t < leg.arrive_at {
                let fraction = (t - leg.depart_at) / leg.duration_min;
                return Some(leg.from.lerp(leg.to, fraction));
            }
        }
        self.legs.last().map(|leg| leg.to)
    }
}

/// In-batch route: hub departure at minute 0, then every customer in the
/// planner's order, with drop-off dwell after each arrival.
pub fn build_batch_route(
    planner: &dyn RoutePlanner,
    timing: &RouteTiming,
    hub: &Hub,
    stops: &[(OrderId, Coordinate)],
) -> Route {
    let coordinates: Vec<Coordinate> = stops.iter().map(|(_, c)| *c).collect();
    let order = planner.sequence(hub.coordinate, &coordinates);

    let mut legs = Vec::with_capacity(stops.len());
    let mut position = hub.coordinate;
    let mut now = 0.0;
    for index in order {
        let (order_id, customer) = stops[index];
        let km = distance_km(position, customer);
        let minutes = timing.travel_minutes(km);
        legs.push(RouteLeg {
            from: position,
            to: customer,
            stop: Stop::Customer(order_id),
            distance_km: km,
            duration_min: minutes,
            depart_at: now,
            arrive_at: now + minutes,
        });
        now += minutes + timing.dropoff_minutes;
        position = customer;
    }

    Route {
        legs,
        depart_at: 0.0,
        finish_at: now,
    }
}

/// Full dispatch route: approach leg from `from` to the hub departing at
/// `depart_at`, pickup dwell, then the in-batch legs. The approach leg is
/// kept even when it has zero length.
pub fn build_dispatch_route(
    batch_route: &Route,
    timing: &RouteTiming,
    hub: &Hub,
    from: Coordinate,
    depart_at: f64,
) -> Route {
    let km = distance_km(from, hub.coordinate);
    let minutes = timing.travel_minutes(km);
    let hub_arrival = depart_at + minutes;
    let hub_departure = hub_arrival + timing.pickup_minutes;

    let approach = RouteLeg {
        from,
        to: hub.coordinate,
        stop: Stop::Hub(hub.id),
        distance_km: km,
        duration_min: minutes,
        depart_at,
        arrive_at: hub_arrival,
    };
    let in_batch = batch_route.shifted(hub_departure - batch_route.depart_at);

    let mut legs = Vec::with_capacity(in_batch.legs.len() + 1);
    legs.push(approach);
    legs.extend(in_batch.legs);
    Route {
        legs,
        depart_at,
        finish_at: in_batch.finish_at,
    }
}
