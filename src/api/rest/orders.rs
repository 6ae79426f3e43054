use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle;
use crate::models::order::{CreateOrderRequest, Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/accept", post(accept_offer))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/start", post(start_delivery))
        .route("/orders/:id/delivered", post(mark_delivered))
        .route("/orders/:id/rating", post(rate_order))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::create_order(&state, payload).await?;
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;
    Ok(Json(order))
}

#[derive(Deserialize)]
struct ListOrdersQuery {
    customer_id: Option<String>,
    status: Option<OrderStatus>,
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Json<Vec<Order>> {
    let mut orders = state.orders.query(|order| {
        query
            .customer_id
            .as_ref()
            .is_none_or(|customer| &order.customer_id == customer)
            && query.status.is_none_or(|status| order.status == status)
    });
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(orders)
}

#[derive(Deserialize)]
struct AcceptOfferRequest {
    offer_id: Uuid,
}

async fn accept_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AcceptOfferRequest>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::accept_offer(&state, id, payload.offer_id)?;
    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::cancel_order(&state, id)?;
    Ok(Json(order))
}

async fn start_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::start_delivery(&state, id)?;
    Ok(Json(order))
}

async fn mark_delivered(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::mark_delivered(&state, id)?;
    Ok(Json(order))
}

#[derive(Deserialize)]
struct RateOrderRequest {
    rating: u8,
    feedback: Option<String>,
}

async fn rate_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::rate_order(&state, id, payload.rating, payload.feedback)?;
    Ok(Json(order))
}
