use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::models::location::{GeoPoint, LocationGraph};
use crate::models::order::VehicleType;
use crate::pricing::PricingTable;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub locations_file: String,
    pub oracle_url: Option<String>,
    pub oracle_timeout_ms: u64,
    pub notify_webhook_url: Option<String>,
    pub pharmacy_base: GeoPoint,
    pub pricing: PricingTable,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            locations_file: env::var("LOCATIONS_FILE")
                .unwrap_or_else(|_| "data/locations.json".to_string()),
            oracle_url: env::var("ORACLE_URL").ok(),
            oracle_timeout_ms: parse_or_default("ORACLE_TIMEOUT_MS", 5_000)?,
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok(),
            pharmacy_base: GeoPoint {
                lat: parse_or_default("PHARMACY_BASE_LAT", 31.1107)?,
                lng: parse_or_default("PHARMACY_BASE_LNG", 30.9388)?,
            },
            pricing: PricingTable {
                base_price: parse_or_default("BASE_PRICE", 10.0)?,
                price_per_km: parse_or_default("PRICE_PER_KM", 3.0)?,
                min_price: parse_or_default("MIN_PRICE", 15.0)?,
                same_village_price: parse_or_default("SAME_VILLAGE_PRICE", 10)?,
                delivery_base_price: parse_or_default("DELIVERY_BASE_PRICE", 20.0)?,
                food_outside_price_per_km: parse_or_default("FOOD_OUTSIDE_PRICE_PER_KM", 5.0)?,
                multipliers: parse_multipliers(
                    &env::var("VEHICLE_MULTIPLIERS")
                        .unwrap_or_else(|_| "MOTORCYCLE=1.0,TOKTOK=1.1,CAR=1.3".to_string()),
                )?,
            },
        })
    }

    /// Location graph is startup-fatal: an empty or malformed graph means no
    /// order can ever resolve a dropoff village.
    pub fn load_locations(&self) -> Result<LocationGraph, AppError> {
        let raw = std::fs::read_to_string(&self.locations_file).map_err(|err| {
            AppError::Internal(format!("failed to read {}: {err}", self.locations_file))
        })?;
        let graph: LocationGraph = serde_json::from_str(&raw).map_err(|err| {
            AppError::Internal(format!(
                "malformed location graph {}: {err}",
                self.locations_file
            ))
        })?;
        if graph.village_count() == 0 {
            return Err(AppError::Internal(
                "location graph has no villages".to_string(),
            ));
        }
        Ok(graph)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

fn parse_multipliers(raw: &str) -> Result<HashMap<VehicleType, f64>, AppError> {
    let mut multipliers = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (vehicle, value) = pair.split_once('=').ok_or_else(|| {
            AppError::Internal(format!("invalid VEHICLE_MULTIPLIERS entry: {pair}"))
        })?;
        let vehicle = vehicle
            .trim()
            .parse::<VehicleType>()
            .map_err(|err| AppError::Internal(format!("invalid VEHICLE_MULTIPLIERS: {err}")))?;
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|err| AppError::Internal(format!("invalid multiplier in '{pair}': {err}")))?;
        multipliers.insert(vehicle, value);
    }
    Ok(multipliers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiplier_list() {
        let multipliers = parse_multipliers("MOTORCYCLE=1.0, TOKTOK=1.1, CAR=1.3").unwrap();
        assert_eq!(multipliers[&VehicleType::Motorcycle], 1.0);
        assert_eq!(multipliers[&VehicleType::Toktok], 1.1);
        assert_eq!(multipliers[&VehicleType::Car], 1.3);
    }

    #[test]
    fn rejects_unknown_vehicle() {
        assert!(parse_multipliers("BICYCLE=0.8").is_err());
    }

    #[test]
    fn rejects_malformed_entry() {
        assert!(parse_multipliers("CAR:1.3").is_err());
    }
}
