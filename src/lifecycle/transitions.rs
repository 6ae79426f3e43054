use crate::models::order::OrderStatus;

/// Legal lifecycle moves. `WaitingForOffers` is initial; `DeliveredRated`
/// and `Cancelled` are terminal; cancellation stays open until the order is
/// delivered.
pub fn is_legal(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    match (from, to) {
        (WaitingForOffers, Accepted) => true,
        (Accepted, ActiveDelivery) => true,
        (ActiveDelivery, Delivered) => true,
        (Delivered, DeliveredRated) => true,
        (WaitingForOffers | Accepted | ActiveDelivery, Cancelled) => true,
        _ => false,
    }
}

pub fn is_terminal(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::DeliveredRated | OrderStatus::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn forward_chain_is_legal() {
        assert!(is_legal(WaitingForOffers, Accepted));
        assert!(is_legal(Accepted, ActiveDelivery));
        assert!(is_legal(ActiveDelivery, Delivered));
        assert!(is_legal(Delivered, DeliveredRated));
    }

    #[test]
    fn cancel_is_legal_only_before_delivery() {
        assert!(is_legal(WaitingForOffers, Cancelled));
        assert!(is_legal(Accepted, Cancelled));
        assert!(is_legal(ActiveDelivery, Cancelled));
        assert!(!is_legal(Delivered, Cancelled));
        assert!(!is_legal(DeliveredRated, Cancelled));
    }

    #[test]
    fn skipping_states_is_illegal() {
        assert!(!is_legal(WaitingForOffers, ActiveDelivery));
        assert!(!is_legal(WaitingForOffers, Delivered));
        assert!(!is_legal(Accepted, Delivered));
        assert!(!is_legal(ActiveDelivery, DeliveredRated));
    }

    #[test]
    fn moving_backward_is_illegal() {
        assert!(!is_legal(Accepted, WaitingForOffers));
        assert!(!is_legal(Delivered, ActiveDelivery));
        assert!(!is_legal(DeliveredRated, Delivered));
    }
}

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;

    fn status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::WaitingForOffers),
            Just(OrderStatus::Accepted),
            Just(OrderStatus::ActiveDelivery),
            Just(OrderStatus::Delivered),
            Just(OrderStatus::DeliveredRated),
            Just(OrderStatus::Cancelled),
        ]
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        proptest!(|(from in status_strategy(), to in status_strategy())| {
            if is_terminal(from) {
                prop_assert!(!is_legal(from, to));
            }
        });
    }

    #[test]
    fn rating_is_reachable_only_from_delivered() {
        proptest!(|(from in status_strategy())| {
            if from != OrderStatus::Delivered {
                prop_assert!(!is_legal(from, OrderStatus::DeliveredRated));
            }
        });
    }
}
