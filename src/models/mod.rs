pub mod location;
pub mod offer;
pub mod order;
