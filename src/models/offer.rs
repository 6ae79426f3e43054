use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A courier's bid against an open order. Offers are never mutated once
/// created; one of them may later be promoted by the customer, the rest
/// simply stay unpromoted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub driver_photo: Option<String>,
    pub driver_rating: Option<f64>,
    pub price: i64,
    /// Receipt sequence, used only for stable display ordering.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOfferRequest {
    pub driver_id: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub driver_photo: Option<String>,
    pub driver_rating: Option<f64>,
    pub price: i64,
}
