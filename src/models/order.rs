use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::Place;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Taxi,
    Food,
    Pharmacy,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Taxi => write!(f, "Taxi"),
            Category::Food => write!(f, "Food"),
            Category::Pharmacy => write!(f, "Pharmacy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Motorcycle,
    Toktok,
    Car,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleType::Motorcycle => write!(f, "Motorcycle"),
            VehicleType::Toktok => write!(f, "Toktok"),
            VehicleType::Car => write!(f, "Car"),
        }
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_uppercase().as_str() {
            "MOTORCYCLE" => Ok(VehicleType::Motorcycle),
            "TOKTOK" => Ok(VehicleType::Toktok),
            "CAR" => Ok(VehicleType::Car),
            other => Err(format!("unknown vehicle type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    WaitingForOffers,
    Accepted,
    ActiveDelivery,
    Delivered,
    DeliveredRated,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::WaitingForOffers => "WaitingForOffers",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::ActiveDelivery => "ActiveDelivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::DeliveredRated => "DeliveredRated",
            OrderStatus::Cancelled => "Cancelled",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: u32,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: String,
    pub customer_phone: String,
    pub category: Category,
    pub status: OrderStatus,
    /// Absent for pharmacy orders, which run from the configured base point.
    pub pickup: Option<Place>,
    pub dropoff: Place,
    pub vehicle_type: VehicleType,
    /// Fare in whole currency units. Fixed at creation; replaced by the
    /// accepted offer's price at acceptance and immutable afterward.
    pub price: i64,
    /// Road distance the fare was derived from; absent on flat-fee paths.
    pub distance_km: Option<f64>,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub driver_photo: Option<String>,
    pub pickup_notes: Option<String>,
    pub dropoff_notes: Option<String>,
    pub restaurant_id: Option<String>,
    pub restaurant_name: Option<String>,
    pub food_items: Vec<CartItem>,
    pub prescription_image: Option<String>,
    pub custom_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rated_at: Option<DateTime<Utc>>,
    pub rating: Option<u8>,
    pub feedback: Option<String>,
}

/// One request variant per category, each carrying exactly the fields its
/// flow needs. The wire shape is internally tagged on `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreateOrderRequest {
    Taxi(TaxiRequest),
    Food(FoodRequest),
    Pharmacy(PharmacyRequest),
    CustomRestaurant(CustomRestaurantRequest),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxiRequest {
    pub customer_id: String,
    pub customer_phone: String,
    pub vehicle_type: VehicleType,
    pub pickup: Place,
    pub dropoff: Place,
    pub pickup_notes: Option<String>,
    pub dropoff_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodRequest {
    pub customer_id: String,
    pub customer_phone: String,
    pub vehicle_type: VehicleType,
    pub restaurant_id: String,
    pub restaurant_name: String,
    /// Restaurant location; its address doubles as the same-village signal.
    pub pickup: Place,
    pub dropoff: Place,
    pub items: Vec<CartItem>,
    /// Menu checkout flows precompute their own total and pass it through;
    /// when absent the fare comes from the pricing engine.
    pub checkout_total: Option<i64>,
    pub dropoff_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PharmacyRequest {
    pub customer_id: String,
    pub customer_phone: String,
    pub vehicle_type: VehicleType,
    pub dropoff: Place,
    pub prescription_image: Option<String>,
    pub custom_note: Option<String>,
    pub dropoff_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomRestaurantRequest {
    pub customer_id: String,
    pub customer_phone: String,
    pub vehicle_type: VehicleType,
    pub restaurant_name: String,
    pub pickup: Place,
    pub dropoff: Place,
    pub custom_note: String,
    pub dropoff_notes: Option<String>,
}
