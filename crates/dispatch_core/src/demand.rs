//! Synthetic demand: orders pinned to hubs with customers sampled nearby.
//!
//! Hubs are assigned round-robin. For every order the generator consumes, in
//! order: two draws per sampling attempt, one draw for the creation offset
//! and one draw for the value jitter. Orders are sorted by creation time
//! (stable) and numbered afterwards, so ids follow creation order.

use tracing::warn;

use crate::ecs::{Hub, Order, OrderId};
use crate::geo::{distance_km, is_within_service_area, sample_point_within_radius, Coordinate};
use crate::rng::LcgRng;
use crate::scenario::ScenarioParams;

/// Outcome of sampling one customer location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerSample {
    pub coordinate: Coordinate,
    pub attempts: u32,
    pub fallback: bool,
}

/// Sample a customer around `hub` that also lies inside the service area.
/// After `max_attempts` rejections the hub coordinate itself is returned with
/// `fallback` set.
pub fn sample_customer(
    rng: &mut LcgRng,
    hub: &Hub,
    service_center: Coordinate,
    service_radius_km: f64,
    max_attempts: u32,
) -> CustomerSample {
    for attempt in 1..=max_attempts {
        let candidate = sample_point_within_radius(rng, hub.coordinate, hub.max_delivery_km);
        if is_within_service_area(candidate, service_center, service_radius_km) {
            return CustomerSample {
                coordinate: candidate,
                attempts: attempt,
                fallback: false,
            };
        }
    }
    CustomerSample {
        coordinate: hub.coordinate,
        attempts: max_attempts,
        fallback: true,
    }
}

/// `avg * (1 + jitter * (2u - 1))`, rounded to cents.
pub fn jittered_value(avg: f64, jitter: f64, u: f64) -> f64 {
    let value = avg * (1.0 + jitter * (2.0 * u - 1.0));
    (value * 100.0).round() / 100.0
}

/// Generate `params.order_count` orders. `hubs` must be non-empty; an empty
/// slice yields no orders.
pub fn generate_orders(params: &ScenarioParams, hubs: &[Hub], service_center: Coordinate) -> Vec<Order> {
    if hubs.is_empty() {
        return Vec::new();
    }

    let mut rng = LcgRng::new(params.seed);
    let mut orders = Vec::with_capacity(params.order_count);

    for i in 0..params.order_count {
        let hub = &hubs[i % hubs.len()];
        let sample = sample_customer(
            &mut rng,
            hub,
            service_center,
            params.service_radius_km,
            params.sampling_attempts,
        );
        if sample.fallback {
            warn!(
                order = i,
                hub = %hub.name,
                attempts = sample.attempts,
                "customer sampling exhausted; placing order at hub coordinate"
            );
        }

        let created_at = rng.next_f64() * params.duration_minutes;
        let value = jittered_value(params.avg_order_value, params.order_value_jitter, rng.next_f64());

        orders.push(Order {
            id: OrderId(0),
            hub_id: hub.id,
            customer: sample.coordinate,
            created_at,
            value,
            distance_from_hub_km: distance_km(hub.coordinate, sample.coordinate),
            fallback: sample.fallback,
        });
    }

    orders.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
    for (i, order) in orders.iter_mut().enumerate() {
        order.id = OrderId(i as u32);
    }
    orders
}
