//! Greedy single-pass clustering of orders into batches.

use crate::ecs::{HubId, Order, OrderId};
use crate::geo::distance_km;

/// Orders grouped for one dispatch, before routing. `order_ids[0]` is the seed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCluster {
    pub hub_id: HubId,
    pub created_at: f64,
    pub order_ids: Vec<OrderId>,
}

impl OrderCluster {
    pub fn seed(&self) -> OrderId {
        self.order_ids[0]
    }

    pub fn len(&self) -> usize {
        self.order_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order_ids.is_empty()
    }
}

/// Pop the earliest remaining order as a seed and pull in every remaining
/// order from the same hub whose customer lies within `radius_km` of the
/// seed's customer. Clusters come back sorted by creation time (stable).
pub fn cluster_orders(orders: &[Order], radius_km: f64) -> Vec<OrderCluster> {
    let mut remaining: Vec<&Order> = orders.iter().collect();
    remaining.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));

    let mut clusters = Vec::new();
    let mut cursor = 0;
    let mut taken = vec![false; remaining.len()];

    while cursor < remaining.len() {
        if taken[cursor] {
            cursor += 1;
            continue;
        }
        let seed = remaining[cursor];
        taken[cursor] = true;

        let mut members = vec![seed];
        for (i, candidate) in remaining.iter().enumerate().skip(cursor + 1) {
            if taken[i] || candidate.hub_id != seed.hub_id {
                continue;
            }
            if distance_km(seed.customer, candidate.customer) <= radius_km {
                taken[i] = true;
                members.push(candidate);
            }
        }

        let created_at = members
            .iter()
            .map(|order| order.created_at)
            .fold(f64::INFINITY, f64::min);
        clusters.push(OrderCluster {
            hub_id: seed.hub_id,
            created_at,
            order_ids: members.iter().map(|order| order.id).collect(),
        });
        cursor += 1;
    }

    clusters.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{destination_point, Coordinate};
    use proptest::prelude::*;

    const HUB: Coordinate = Coordinate::new(52.52, 13.405);

    fn order(id: u32, hub: u32, created_at: f64, customer: Coordinate) -> Order {
        Order {
            id: OrderId(id),
            hub_id: HubId(hub),
            customer,
            created_at,
            value: 20.0,
            distance_from_hub_km: 0.0,
            fallback: false,
        }
    }

    #[test]
    fn nearby_orders_from_same_hub_share_a_batch() {
        let orders = vec![
            order(0, 0, 1.0, destination_point(HUB, 0.0, 1.0)),
            order(1, 0, 2.0, destination_point(HUB, 0.1, 1.2)),
            order(2, 0, 3.0, destination_point(HUB, 3.1, 4.0)),
        ];
        let clusters = cluster_orders(&orders, 0.5);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].order_ids, vec![OrderId(0), OrderId(1)]);
        assert_eq!(clusters[1].order_ids, vec![OrderId(2)]);
    }

    #[test]
    fn orders_from_different_hubs_never_mix() {
        let point = destination_point(HUB, 1.0, 0.5);
        let orders = vec![order(0, 0, 1.0, point), order(1, 1, 1.5, point)];
        let clusters = cluster_orders(&orders, 10.0);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn created_at_is_member_minimum_and_clusters_are_sorted() {
        let orders = vec![
            order(0, 0, 9.0, destination_point(HUB, 0.0, 2.0)),
            order(1, 1, 4.0, destination_point(HUB, 2.0, 2.0)),
            order(2, 0, 5.0, destination_point(HUB, 0.0, 2.1)),
        ];
        let clusters = cluster_orders(&orders, 1.0);
        assert_eq!(clusters[0].created_at, 4.0);
        assert_eq!(clusters[1].created_at, 5.0);
        assert_eq!(clusters[1].seed(), OrderId(2));
        assert_eq!(clusters[1].order_ids, vec![OrderId(2), OrderId(0)]);
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        assert!(cluster_orders(&[], 5.0).is_empty());
    }

    proptest! {
        #[test]
        fn clusters_partition_orders_and_respect_radius(
            points in prop::collection::vec((0u32..3, 0.0f64..60.0, 0.0f64..6.3, 0.0f64..6.0), 1..40),
            radius in 0.2f64..5.0,
        ) {
            let orders: Vec<Order> = points
                .iter()
                .enumerate()
                .map(|(i, (hub, t, bearing, km))| {
                    order(i as u32, *hub, *t, destination_point(HUB, *bearing, *km))
                })
                .collect();
            let clusters = cluster_orders(&orders, radius);

            let mut seen: Vec<OrderId> = clusters.iter().flat_map(|c| c.order_ids.clone()).collect();
            seen.sort();
            let expected: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
            prop_assert_eq!(seen, expected);

            for cluster in &clusters {
                let seed = &orders[cluster.seed().0 as usize];
                for id in &cluster.order_ids {
                    let member = &orders[id.0 as usize];
                    prop_assert_eq!(member.hub_id, cluster.hub_id);
                    prop_assert!(distance_km(seed.customer, member.customer) <= radius);
                }
            }
            for pair in clusters.windows(2) {
                prop_assert!(pair[0].created_at <= pair[1].created_at);
            }
        }
    }
}
