use std::collections::HashMap;

use thiserror::Error;

use crate::models::location::Village;
use crate::models::order::{Category, VehicleType};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PricingError {
    #[error("distance is required for a {0} fare")]
    MissingDistance(Category),
    #[error("invalid distance: {0}")]
    InvalidDistance(f64),
}

/// Pricing constants, loaded once at startup and immutable afterward.
#[derive(Debug, Clone)]
pub struct PricingTable {
    pub base_price: f64,
    pub price_per_km: f64,
    pub min_price: f64,
    pub same_village_price: i64,
    pub delivery_base_price: f64,
    pub food_outside_price_per_km: f64,
    pub multipliers: HashMap<VehicleType, f64>,
}

impl PricingTable {
    pub fn multiplier(&self, vehicle: VehicleType) -> f64 {
        self.multipliers.get(&vehicle).copied().unwrap_or(1.0)
    }
}

pub struct FareInput<'a> {
    pub category: Category,
    pub vehicle: VehicleType,
    pub pickup_village: Option<&'a Village>,
    pub dropoff_village: &'a Village,
    /// Free-text pickup address; food fares compare it against the dropoff
    /// village name to detect same-village delivery.
    pub pickup_address: Option<&'a str>,
    pub distance_km: Option<f64>,
}

/// Fare estimate in whole currency units. Pure and deterministic; the rules
/// are evaluated in precedence order, flat fees before metered fares.
pub fn estimate(table: &PricingTable, input: &FareInput<'_>) -> Result<i64, PricingError> {
    match input.category {
        Category::Taxi => {
            if let Some(pickup) = input.pickup_village {
                if pickup.id == input.dropoff_village.id {
                    return Ok(table.same_village_price);
                }
            }
            let distance = checked_distance(input)?;
            let metered =
                (table.base_price + distance * table.price_per_km) * table.multiplier(input.vehicle);
            Ok(metered.max(table.min_price).round() as i64)
        }
        Category::Food => {
            if input.pickup_address == Some(input.dropoff_village.name.as_str()) {
                return Ok(table.same_village_price);
            }
            // Strictly distance-proportional: no minimum floor on food runs.
            let distance = checked_distance(input)?;
            Ok((distance * table.food_outside_price_per_km).round() as i64)
        }
        Category::Pharmacy => {
            let distance = checked_distance(input)?;
            let metered = (table.delivery_base_price + distance * table.price_per_km)
                * table.multiplier(input.vehicle);
            Ok(metered.max(table.delivery_base_price).round() as i64)
        }
    }
}

fn checked_distance(input: &FareInput<'_>) -> Result<f64, PricingError> {
    let distance = input
        .distance_km
        .ok_or(PricingError::MissingDistance(input.category))?;
    if !distance.is_finite() || distance < 0.0 {
        return Err(PricingError::InvalidDistance(distance));
    }
    Ok(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::GeoPoint;

    fn village(id: u32, name: &str) -> Village {
        Village {
            id,
            name: name.to_string(),
            center: GeoPoint { lat: 31.1, lng: 30.9 },
        }
    }

    fn table() -> PricingTable {
        PricingTable {
            base_price: 10.0,
            price_per_km: 3.0,
            min_price: 15.0,
            same_village_price: 10,
            delivery_base_price: 20.0,
            food_outside_price_per_km: 5.0,
            multipliers: HashMap::from([
                (VehicleType::Motorcycle, 1.0),
                (VehicleType::Car, 1.2),
            ]),
        }
    }

    fn input<'a>(
        category: Category,
        vehicle: VehicleType,
        pickup_village: Option<&'a Village>,
        dropoff_village: &'a Village,
        distance_km: Option<f64>,
    ) -> FareInput<'a> {
        FareInput {
            category,
            vehicle,
            pickup_village,
            dropoff_village,
            pickup_address: None,
            distance_km,
        }
    }

    #[test]
    fn taxi_cross_village_metered_fare() {
        let a = village(1, "Sidi Salem");
        let b = village(2, "Desouk");
        // round(max(15, (10 + 10*3) * 1.2)) = 48
        let price = estimate(
            &table(),
            &input(Category::Taxi, VehicleType::Car, Some(&a), &b, Some(10.0)),
        )
        .unwrap();
        assert_eq!(price, 48);
    }

    #[test]
    fn taxi_same_village_is_flat_regardless_of_distance() {
        let a = village(1, "Sidi Salem");
        for distance in [None, Some(0.0), Some(999.0)] {
            let price = estimate(
                &table(),
                &input(Category::Taxi, VehicleType::Car, Some(&a), &a, distance),
            )
            .unwrap();
            assert_eq!(price, 10);
        }
    }

    #[test]
    fn taxi_minimum_fare_floor_applies() {
        let a = village(1, "Sidi Salem");
        let b = village(2, "Desouk");
        // (10 + 0.5*3) * 1.0 = 11.5, floored up to min_price 15
        let price = estimate(
            &table(),
            &input(
                Category::Taxi,
                VehicleType::Motorcycle,
                Some(&a),
                &b,
                Some(0.5),
            ),
        )
        .unwrap();
        assert_eq!(price, 15);
    }

    #[test]
    fn pharmacy_worked_scenario() {
        let b = village(2, "Desouk");
        // round(max(20, (20 + 2*3) * 1)) = 26
        let price = estimate(
            &table(),
            &input(
                Category::Pharmacy,
                VehicleType::Motorcycle,
                None,
                &b,
                Some(2.0),
            ),
        )
        .unwrap();
        assert_eq!(price, 26);
    }

    #[test]
    fn food_same_village_flat_fee_from_address_match() {
        let b = village(2, "Desouk");
        let fare_input = FareInput {
            category: Category::Food,
            vehicle: VehicleType::Motorcycle,
            pickup_village: None,
            dropoff_village: &b,
            pickup_address: Some("Desouk"),
            distance_km: None,
        };
        assert_eq!(estimate(&table(), &fare_input).unwrap(), 10);
    }

    #[test]
    fn food_cross_village_has_no_floor() {
        let b = village(2, "Desouk");
        let fare_input = FareInput {
            category: Category::Food,
            vehicle: VehicleType::Motorcycle,
            pickup_village: None,
            dropoff_village: &b,
            pickup_address: Some("Sidi Salem restaurant row"),
            distance_km: Some(0.4),
        };
        // round(0.4 * 5) = 2, well below any base fare
        assert_eq!(estimate(&table(), &fare_input).unwrap(), 2);
    }

    #[test]
    fn unconfigured_vehicle_multiplier_defaults_to_one() {
        let a = village(1, "Sidi Salem");
        let b = village(2, "Desouk");
        let price = estimate(
            &table(),
            &input(Category::Taxi, VehicleType::Toktok, Some(&a), &b, Some(10.0)),
        )
        .unwrap();
        // (10 + 30) * 1.0 = 40
        assert_eq!(price, 40);
    }

    #[test]
    fn missing_distance_is_rejected() {
        let a = village(1, "Sidi Salem");
        let b = village(2, "Desouk");
        let result = estimate(
            &table(),
            &input(Category::Taxi, VehicleType::Car, Some(&a), &b, None),
        );
        assert_eq!(result, Err(PricingError::MissingDistance(Category::Taxi)));
    }

    #[test]
    fn negative_distance_is_rejected() {
        let b = village(2, "Desouk");
        let result = estimate(
            &table(),
            &input(Category::Pharmacy, VehicleType::Car, None, &b, Some(-3.0)),
        );
        assert_eq!(result, Err(PricingError::InvalidDistance(-3.0)));
    }
}

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::location::GeoPoint;

    fn village(id: u32, name: &str) -> Village {
        Village {
            id,
            name: name.to_string(),
            center: GeoPoint { lat: 31.1, lng: 30.9 },
        }
    }

    fn table() -> PricingTable {
        PricingTable {
            base_price: 10.0,
            price_per_km: 3.0,
            min_price: 15.0,
            same_village_price: 10,
            delivery_base_price: 20.0,
            food_outside_price_per_km: 5.0,
            multipliers: HashMap::from([
                (VehicleType::Motorcycle, 1.0),
                (VehicleType::Toktok, 1.1),
                (VehicleType::Car, 1.2),
            ]),
        }
    }

    fn vehicle_strategy() -> impl Strategy<Value = VehicleType> {
        prop_oneof![
            Just(VehicleType::Motorcycle),
            Just(VehicleType::Toktok),
            Just(VehicleType::Car),
        ]
    }

    #[test]
    fn taxi_same_village_flat_for_every_vehicle_and_distance() {
        proptest!(|(vehicle in vehicle_strategy(), distance in 0.0f64..500.0)| {
            let a = village(1, "Sidi Salem");
            let fare_input = FareInput {
                category: Category::Taxi,
                vehicle,
                pickup_village: Some(&a),
                dropoff_village: &a,
                pickup_address: None,
                distance_km: Some(distance),
            };
            prop_assert_eq!(estimate(&table(), &fare_input).unwrap(), 10);
        });
    }

    #[test]
    fn pharmacy_fare_never_below_delivery_base() {
        proptest!(|(vehicle in vehicle_strategy(), distance in 0.0f64..500.0)| {
            let b = village(2, "Desouk");
            let fare_input = FareInput {
                category: Category::Pharmacy,
                vehicle,
                pickup_village: None,
                dropoff_village: &b,
                pickup_address: None,
                distance_km: Some(distance),
            };
            let price = estimate(&table(), &fare_input).unwrap();
            prop_assert!(price >= 20);
        });
    }

    #[test]
    fn pharmacy_fare_is_monotone_in_distance() {
        proptest!(|(
            vehicle in vehicle_strategy(),
            near in 0.0f64..250.0,
            extra in 0.0f64..250.0,
        )| {
            let b = village(2, "Desouk");
            let fare = |distance: f64| {
                let fare_input = FareInput {
                    category: Category::Pharmacy,
                    vehicle,
                    pickup_village: None,
                    dropoff_village: &b,
                    pickup_address: None,
                    distance_km: Some(distance),
                };
                estimate(&table(), &fare_input).unwrap()
            };
            prop_assert!(fare(near + extra) >= fare(near));
        });
    }

    #[test]
    fn food_cross_village_is_exactly_proportional() {
        proptest!(|(distance in 0.0f64..500.0)| {
            let b = village(2, "Desouk");
            let fare_input = FareInput {
                category: Category::Food,
                vehicle: VehicleType::Motorcycle,
                pickup_village: None,
                dropoff_village: &b,
                pickup_address: Some("Sidi Salem restaurant row"),
                distance_km: Some(distance),
            };
            let price = estimate(&table(), &fare_input).unwrap();
            prop_assert_eq!(price, (distance * 5.0).round() as i64);
        });
    }
}
