use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::location::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("route request failed: {0}")]
    Transport(String),
    #[error("no route found between the given points")]
    NoRoute,
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy)]
pub struct RoadDistance {
    pub distance_km: f64,
    pub duration_min: Option<f64>,
}

/// Black-box road-distance service. Callers treat a failure as "distance
/// unknown", never as zero.
#[async_trait]
pub trait DistanceOracle: Send + Sync {
    async fn road_distance(
        &self,
        origin: GeoPoint,
        dest: GeoPoint,
    ) -> Result<RoadDistance, OracleError>;
}

/// OSRM-compatible routing client with a hard request timeout.
pub struct OsrmOracle {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmOracle {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| OracleError::Transport(err.to_string()))?;
        Ok(Self { client, base_url })
    }
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

#[async_trait]
impl DistanceOracle for OsrmOracle {
    async fn road_distance(
        &self,
        origin: GeoPoint,
        dest: GeoPoint,
    ) -> Result<RoadDistance, OracleError> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=false",
            self.base_url, origin.lng, origin.lat, dest.lng, dest.lat
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| OracleError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| OracleError::Transport(err.to_string()))?
            .json::<OsrmResponse>()
            .await
            .map_err(|err| OracleError::Malformed(err.to_string()))?;

        if response.code != "Ok" {
            return Err(OracleError::NoRoute);
        }
        let route = response.routes.first().ok_or(OracleError::NoRoute)?;

        Ok(RoadDistance {
            distance_km: route.distance / 1000.0,
            duration_min: Some(route.duration / 60.0),
        })
    }
}

/// Straight-line estimates for local development and tests. Real deployments
/// point `ORACLE_URL` at a routing service instead.
pub struct HaversineOracle;

#[async_trait]
impl DistanceOracle for HaversineOracle {
    async fn road_distance(
        &self,
        origin: GeoPoint,
        dest: GeoPoint,
    ) -> Result<RoadDistance, OracleError> {
        Ok(RoadDistance {
            distance_km: haversine_km(&origin, &dest),
            duration_min: None,
        })
    }
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}
