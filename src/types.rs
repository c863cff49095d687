use serde::{Deserialize, Serialize};

/// One cleaned Paris listing. Field order matches the cleaned CSV header and
/// the columns of the materialized table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub listing_id: String,
    pub city: String,
    /// Display token like "1er" or "14e"; absent when the raw district could
    /// not be parsed and no quarter lookup applied.
    pub district: Option<String>,
    pub neighbourhood: Option<String>,
    pub room_type: Option<String>,
    pub price: f64,
    pub latitude: f64,
    pub longitude: f64,
}
