pub mod transitions;

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::location::{GeoPoint, Place, Village};
use crate::models::offer::Offer;
use crate::models::order::{
    CartItem, Category, CreateOrderRequest, CustomRestaurantRequest, FoodRequest, Order,
    OrderStatus, PharmacyRequest, TaxiRequest, VehicleType,
};
use crate::pricing::{self, FareInput};
use crate::state::AppState;
use crate::store::StoreError;

/// Creates an order in `WaitingForOffers`. Distance is resolved through the
/// oracle only where the fare depends on it; a flat-fee route never touches
/// the oracle, so it stays available while the oracle is down.
pub async fn create_order(
    state: &AppState,
    request: CreateOrderRequest,
) -> Result<Order, AppError> {
    let order = match request {
        CreateOrderRequest::Taxi(req) => build_taxi(state, req).await?,
        CreateOrderRequest::Food(req) => build_food(state, req).await?,
        CreateOrderRequest::Pharmacy(req) => build_pharmacy(state, req).await?,
        CreateOrderRequest::CustomRestaurant(req) => build_custom_restaurant(state, req).await?,
    };

    state.orders.put(order.id, order.clone());
    state
        .metrics
        .orders_created_total
        .with_label_values(&[&order.category.to_string()])
        .inc();
    send_notification(state, created_summary(&order));

    info!(
        order_id = %order.id,
        category = %order.category,
        price = order.price,
        "order created"
    );
    Ok(order)
}

/// Promotes one offer. The status precondition and the driver-field writes
/// form a single conditional update, so a racing second acceptance (or a
/// cancel) observes a definitive conflict instead of a partial overwrite.
pub fn accept_offer(state: &AppState, order_id: Uuid, offer_id: Uuid) -> Result<Order, AppError> {
    let offer = state
        .offers
        .get(&offer_id)
        .ok_or_else(|| AppError::NotFound(format!("offer {offer_id} not found")))?;
    if offer.order_id != order_id {
        return Err(AppError::Validation(
            "offer does not belong to this order".to_string(),
        ));
    }

    let now = Utc::now();
    let updated = state
        .orders
        .conditional_update(
            order_id,
            |order| order.status == OrderStatus::WaitingForOffers,
            |order| {
                order.status = OrderStatus::Accepted;
                order.driver_id = Some(offer.driver_id.clone());
                order.driver_name = Some(offer.driver_name.clone());
                order.driver_phone = Some(offer.driver_phone.clone());
                order.driver_photo = offer.driver_photo.clone();
                order.price = offer.price;
                order.accepted_at = Some(now);
            },
        )
        .map_err(|err| {
            transition_error(state, "accept", order_id, err, "order is no longer open for offers")
        })?;

    record_transition(state, "accept");
    send_notification(state, accepted_summary(&updated, &offer));

    info!(
        order_id = %order_id,
        offer_id = %offer_id,
        driver_id = %offer.driver_id,
        price = offer.price,
        "offer accepted"
    );
    Ok(updated)
}

pub fn cancel_order(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    let updated = state
        .orders
        .conditional_update(
            order_id,
            |order| transitions::is_legal(order.status, OrderStatus::Cancelled),
            |order| order.status = OrderStatus::Cancelled,
        )
        .map_err(|err| {
            transition_error(state, "cancel", order_id, err, "order can no longer be cancelled")
        })?;

    record_transition(state, "cancel");
    info!(order_id = %order_id, "order cancelled");
    Ok(updated)
}

/// Courier-driven: the assigned courier picked the order up.
pub fn start_delivery(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    let updated = state
        .orders
        .conditional_update(
            order_id,
            |order| order.status == OrderStatus::Accepted,
            |order| order.status = OrderStatus::ActiveDelivery,
        )
        .map_err(|err| {
            transition_error(state, "start", order_id, err, "delivery can only start from an accepted order")
        })?;

    record_transition(state, "start");
    info!(order_id = %order_id, "delivery started");
    Ok(updated)
}

pub fn mark_delivered(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    let updated = state
        .orders
        .conditional_update(
            order_id,
            |order| order.status == OrderStatus::ActiveDelivery,
            |order| order.status = OrderStatus::Delivered,
        )
        .map_err(|err| {
            transition_error(state, "deliver", order_id, err, "order is not out for delivery")
        })?;

    record_transition(state, "deliver");
    info!(order_id = %order_id, "order delivered");
    Ok(updated)
}

pub fn rate_order(
    state: &AppState,
    order_id: Uuid,
    rating: u8,
    feedback: Option<String>,
) -> Result<Order, AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(format!(
            "rating must be between 1 and 5, got {rating}"
        )));
    }

    let now = Utc::now();
    let updated = state
        .orders
        .conditional_update(
            order_id,
            |order| order.status == OrderStatus::Delivered,
            |order| {
                order.status = OrderStatus::DeliveredRated;
                order.rating = Some(rating);
                order.feedback = feedback.clone();
                order.rated_at = Some(now);
            },
        )
        .map_err(|err| {
            transition_error(state, "rate", order_id, err, "only a delivered, unrated order can be rated")
        })?;

    record_transition(state, "rate");
    info!(order_id = %order_id, rating, "order rated");
    Ok(updated)
}

async fn build_taxi(state: &AppState, req: TaxiRequest) -> Result<Order, AppError> {
    let dropoff_village = resolve_dropoff(state, &req.dropoff)?;
    let pickup_village = state.locations.village_by_name(&req.pickup.village_name);
    let same_village = pickup_village.is_some_and(|v| v.id == dropoff_village.id);

    let distance_km = if same_village {
        None
    } else {
        Some(resolve_distance(state, req.pickup.point(), req.dropoff.point()).await?)
    };

    let price = estimate_fare(
        state,
        FareInput {
            category: Category::Taxi,
            vehicle: req.vehicle_type,
            pickup_village,
            dropoff_village,
            pickup_address: None,
            distance_km,
        },
    )?;

    let mut order = blank_order(
        Category::Taxi,
        req.customer_id,
        req.customer_phone,
        req.vehicle_type,
        Some(req.pickup),
        req.dropoff,
        price,
        distance_km,
    );
    order.pickup_notes = req.pickup_notes;
    order.dropoff_notes = req.dropoff_notes;
    Ok(order)
}

async fn build_food(state: &AppState, req: FoodRequest) -> Result<Order, AppError> {
    let dropoff_village = resolve_dropoff(state, &req.dropoff)?;
    if req.items.is_empty() {
        return Err(AppError::Validation(
            "food order must contain at least one item".to_string(),
        ));
    }
    validate_cart(&req.items)?;

    let (price, distance_km) = match req.checkout_total {
        Some(total) if total > 0 => (total, None),
        Some(total) => {
            return Err(AppError::Validation(format!(
                "checkout total must be positive, got {total}"
            )));
        }
        None => {
            let same_village = req.pickup.address == dropoff_village.name;
            let distance_km = if same_village {
                None
            } else {
                Some(resolve_distance(state, req.pickup.point(), req.dropoff.point()).await?)
            };
            let price = estimate_fare(
                state,
                FareInput {
                    category: Category::Food,
                    vehicle: req.vehicle_type,
                    pickup_village: None,
                    dropoff_village,
                    pickup_address: Some(&req.pickup.address),
                    distance_km,
                },
            )?;
            (price, distance_km)
        }
    };

    let mut order = blank_order(
        Category::Food,
        req.customer_id,
        req.customer_phone,
        req.vehicle_type,
        Some(req.pickup),
        req.dropoff,
        price,
        distance_km,
    );
    order.restaurant_id = Some(req.restaurant_id);
    order.restaurant_name = Some(req.restaurant_name);
    order.food_items = req.items;
    order.dropoff_notes = req.dropoff_notes;
    Ok(order)
}

async fn build_pharmacy(state: &AppState, req: PharmacyRequest) -> Result<Order, AppError> {
    let dropoff_village = resolve_dropoff(state, &req.dropoff)?;
    let distance_km =
        Some(resolve_distance(state, state.pharmacy_base, req.dropoff.point()).await?);

    let price = estimate_fare(
        state,
        FareInput {
            category: Category::Pharmacy,
            vehicle: req.vehicle_type,
            pickup_village: None,
            dropoff_village,
            pickup_address: None,
            distance_km,
        },
    )?;

    let mut order = blank_order(
        Category::Pharmacy,
        req.customer_id,
        req.customer_phone,
        req.vehicle_type,
        None,
        req.dropoff,
        price,
        distance_km,
    );
    order.prescription_image = req.prescription_image;
    order.custom_note = req.custom_note;
    order.dropoff_notes = req.dropoff_notes;
    Ok(order)
}

async fn build_custom_restaurant(
    state: &AppState,
    req: CustomRestaurantRequest,
) -> Result<Order, AppError> {
    let dropoff_village = resolve_dropoff(state, &req.dropoff)?;
    let same_village = req.pickup.address == dropoff_village.name;

    let distance_km = if same_village {
        None
    } else {
        Some(resolve_distance(state, req.pickup.point(), req.dropoff.point()).await?)
    };

    let price = estimate_fare(
        state,
        FareInput {
            category: Category::Food,
            vehicle: req.vehicle_type,
            pickup_village: None,
            dropoff_village,
            pickup_address: Some(&req.pickup.address),
            distance_km,
        },
    )?;

    let mut order = blank_order(
        Category::Food,
        req.customer_id,
        req.customer_phone,
        req.vehicle_type,
        Some(req.pickup),
        req.dropoff,
        price,
        distance_km,
    );
    order.restaurant_name = Some(req.restaurant_name);
    order.custom_note = Some(req.custom_note);
    order.dropoff_notes = req.dropoff_notes;
    Ok(order)
}

fn resolve_dropoff<'a>(state: &'a AppState, dropoff: &Place) -> Result<&'a Village, AppError> {
    if dropoff.village_name.trim().is_empty() {
        return Err(AppError::Validation(
            "no dropoff village selected".to_string(),
        ));
    }
    state
        .locations
        .village_by_name(&dropoff.village_name)
        .ok_or_else(|| {
            AppError::Validation(format!("unknown dropoff village: {}", dropoff.village_name))
        })
}

fn validate_cart(items: &[CartItem]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for item in items {
        if item.quantity == 0 {
            return Err(AppError::Validation(format!(
                "cart item '{}' has zero quantity",
                item.name
            )));
        }
        if item.price < 0 {
            return Err(AppError::Validation(format!(
                "cart item '{}' has a negative price",
                item.name
            )));
        }
        if !seen.insert(item.id) {
            return Err(AppError::Validation(format!(
                "duplicate cart item id {}",
                item.id
            )));
        }
    }
    Ok(())
}

async fn resolve_distance(
    state: &AppState,
    origin: GeoPoint,
    dest: GeoPoint,
) -> Result<f64, AppError> {
    let start = Instant::now();
    let result = state.oracle.road_distance(origin, dest).await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(road) => {
            state
                .metrics
                .oracle_latency_seconds
                .with_label_values(&["success"])
                .observe(elapsed);
            Ok(road.distance_km)
        }
        Err(err) => {
            state
                .metrics
                .oracle_latency_seconds
                .with_label_values(&["error"])
                .observe(elapsed);
            warn!(error = %err, "distance resolution failed");
            Err(AppError::OracleUnavailable(err.to_string()))
        }
    }
}

fn estimate_fare(state: &AppState, input: FareInput<'_>) -> Result<i64, AppError> {
    pricing::estimate(&state.pricing, &input)
        .map_err(|err| AppError::Internal(format!("fare computation failed: {err}")))
}

fn blank_order(
    category: Category,
    customer_id: String,
    customer_phone: String,
    vehicle_type: VehicleType,
    pickup: Option<Place>,
    dropoff: Place,
    price: i64,
    distance_km: Option<f64>,
) -> Order {
    Order {
        id: Uuid::new_v4(),
        customer_id,
        customer_phone,
        category,
        status: OrderStatus::WaitingForOffers,
        pickup,
        dropoff,
        vehicle_type,
        price,
        distance_km,
        driver_id: None,
        driver_name: None,
        driver_phone: None,
        driver_photo: None,
        pickup_notes: None,
        dropoff_notes: None,
        restaurant_id: None,
        restaurant_name: None,
        food_items: Vec::new(),
        prescription_image: None,
        custom_note: None,
        created_at: Utc::now(),
        accepted_at: None,
        rated_at: None,
        rating: None,
        feedback: None,
    }
}

fn transition_error(
    state: &AppState,
    transition: &str,
    order_id: Uuid,
    err: StoreError,
    conflict_msg: &str,
) -> AppError {
    match err {
        StoreError::NotFound => AppError::NotFound(format!("order {order_id} not found")),
        StoreError::Conflict => {
            state
                .metrics
                .transitions_total
                .with_label_values(&[transition, "conflict"])
                .inc();
            AppError::Conflict(conflict_msg.to_string())
        }
    }
}

fn record_transition(state: &AppState, transition: &str) {
    state
        .metrics
        .transitions_total
        .with_label_values(&[transition, "success"])
        .inc();
}

fn created_summary(order: &Order) -> String {
    let route = match &order.pickup {
        Some(pickup) => format!("{} -> {}", pickup.village_name, order.dropoff.village_name),
        None => format!("-> {}", order.dropoff.village_name),
    };
    format!(
        "new {} order {} ({route}), vehicle {}, fare {}",
        order.category, order.id, order.vehicle_type, order.price
    )
}

fn accepted_summary(order: &Order, offer: &Offer) -> String {
    format!(
        "order {} accepted by {} ({}) for {}",
        order.id, offer.driver_name, offer.driver_phone, offer.price
    )
}

/// Best-effort by contract: the transition already committed, so a failed
/// notification is logged and dropped.
fn send_notification(state: &AppState, summary: String) {
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(err) = notifier.notify(&summary).await {
            warn!(error = %err, "dispatch notification failed");
        }
    });
}
