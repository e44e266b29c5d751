use crate::telemetry::DeliveryRecord;

/// Checks that a delivery's timestamps follow the lifecycle: the order is
/// picked up no earlier than it was created and its batch became ready, and
/// delivered no earlier than picked up or its projected arrival. Returns a
/// description of the first violation, `None` when valid.
pub fn validate_delivery_ordering(record: &DeliveryRecord) -> Option<String> {
    let checks = [
        ("created_at", record.created_at, "picked_up_at", record.picked_up_at),
        ("ready_at", record.ready_at, "picked_up_at", record.picked_up_at),
        ("picked_up_at", record.picked_up_at, "delivered_at", record.delivered_at),
        ("eta", record.eta, "delivered_at", record.delivered_at),
    ];
    checks
        .iter()
        .find(|(_, earlier, _, later)| earlier > later)
        .map(|(earlier_name, earlier, later_name, later)| {
            format!(
                "Order {}: {earlier_name} ({earlier}) > {later_name} ({later})",
                record.order_id.0
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{BatchId, DriverId, OrderId};

    fn record() -> DeliveryRecord {
        DeliveryRecord {
            order_id: OrderId(4),
            batch_id: BatchId(1),
            driver_id: DriverId(0),
            created_at: 3.0,
            ready_at: 15.0,
            picked_up_at: 18.0,
            delivered_at: 26.0,
            eta: 25.4,
        }
    }

    #[test]
    fn ordered_record_is_valid() {
        assert_eq!(validate_delivery_ordering(&record()), None);
    }

    #[test]
    fn pickup_before_ready_is_reported() {
        let mut bad = record();
        bad.picked_up_at = 10.0;
        let message = validate_delivery_ordering(&bad).expect("violation");
        assert!(message.contains("ready_at"));
    }

    #[test]
    fn early_delivery_is_reported() {
        let mut bad = record();
        bad.delivered_at = 25.0;
        let message = validate_delivery_ordering(&bad).expect("violation");
        assert!(message.contains("eta"));
    }
}
