use std::sync::Arc;

use crate::models::location::{GeoPoint, LocationGraph};
use crate::models::offer::Offer;
use crate::models::order::Order;
use crate::notify::DispatchNotifier;
use crate::observability::metrics::Metrics;
use crate::oracle::DistanceOracle;
use crate::pricing::PricingTable;
use crate::store::Collection;

pub struct AppState {
    pub orders: Collection<Order>,
    pub offers: Collection<Offer>,
    pub locations: LocationGraph,
    pub pricing: PricingTable,
    pub pharmacy_base: GeoPoint,
    pub oracle: Arc<dyn DistanceOracle>,
    pub notifier: Arc<dyn DispatchNotifier>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        event_buffer_size: usize,
        locations: LocationGraph,
        pricing: PricingTable,
        pharmacy_base: GeoPoint,
        oracle: Arc<dyn DistanceOracle>,
        notifier: Arc<dyn DispatchNotifier>,
    ) -> Self {
        Self {
            orders: Collection::new(event_buffer_size),
            offers: Collection::new(event_buffer_size),
            locations,
            pricing,
            pharmacy_base,
            oracle,
            notifier,
            metrics: Metrics::new(),
        }
    }
}
