use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::post;
use uuid::Uuid;

use crate::error::AppError;
use crate::matching;
use crate::models::offer::{Offer, SubmitOfferRequest};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/orders/:id/offers", post(submit_offer).get(list_offers))
}

async fn submit_offer(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<SubmitOfferRequest>,
) -> Result<Json<Offer>, AppError> {
    let offer = matching::submit_offer(&state, order_id, payload)?;
    Ok(Json(offer))
}

async fn list_offers(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<Offer>>, AppError> {
    let offers = matching::list_offers(&state, order_id)?;
    Ok(Json(offers))
}
