use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::offer::{Offer, SubmitOfferRequest};
use crate::models::order::OrderStatus;
use crate::state::AppState;

/// Appends a courier's bid against an open order. Offers need no coordination
/// between couriers; an accept can still land between the status check and
/// the write, which is harmless because acceptance re-checks order status
/// under its own conditional update.
pub fn submit_offer(
    state: &AppState,
    order_id: Uuid,
    request: SubmitOfferRequest,
) -> Result<Offer, AppError> {
    if request.price <= 0 {
        return Err(AppError::Validation(
            "offer price must be positive".to_string(),
        ));
    }

    let order = state
        .orders
        .get(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
    if order.status != OrderStatus::WaitingForOffers {
        return Err(AppError::OrderClosed);
    }

    let offer = Offer {
        id: Uuid::new_v4(),
        order_id,
        driver_id: request.driver_id,
        driver_name: request.driver_name,
        driver_phone: request.driver_phone,
        driver_photo: request.driver_photo,
        driver_rating: request.driver_rating,
        price: request.price,
        sequence: state.offers.next_receipt(),
        created_at: Utc::now(),
    };

    state.offers.put(offer.id, offer.clone());
    state.metrics.offers_submitted_total.inc();

    info!(
        order_id = %order_id,
        offer_id = %offer.id,
        driver_id = %offer.driver_id,
        price = offer.price,
        "offer submitted"
    );
    Ok(offer)
}

/// Current offer set in receipt order. Display only; the customer chooses.
pub fn list_offers(state: &AppState, order_id: Uuid) -> Result<Vec<Offer>, AppError> {
    state
        .orders
        .get(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    let mut offers = state.offers.query(|offer| offer.order_id == order_id);
    offers.sort_by_key(|offer| offer.sequence);
    Ok(offers)
}
