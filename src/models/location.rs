use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A concrete pickup or dropoff point as picked by the customer.
/// `village_name` ties the point back into the location graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub village_name: String,
}

impl Place {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Village {
    pub id: u32,
    pub name: String,
    pub center: GeoPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct District {
    pub id: u32,
    pub name: String,
    pub villages: Vec<Village>,
}

/// Static two-level location hierarchy. Loaded once at startup and never
/// mutated afterward; pricing and same-village detection read it only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationGraph {
    pub districts: Vec<District>,
}

impl LocationGraph {
    pub fn village_by_name(&self, name: &str) -> Option<&Village> {
        self.districts
            .iter()
            .flat_map(|district| district.villages.iter())
            .find(|village| village.name == name)
    }

    pub fn village_count(&self) -> usize {
        self.districts
            .iter()
            .map(|district| district.villages.len())
            .sum()
    }
}
