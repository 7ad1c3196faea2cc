//! Current-weather response from the upstream API
//!
//! Every field is optional here so that a missing field can be reported
//! precisely by the normalizer instead of failing the whole decode.

use serde::{Deserialize, Serialize};

/// Raw `/data/2.5/weather` response (only the fields the collector reads)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpstreamObservation {
    pub id: Option<i64>,
    pub main: Option<UpstreamMain>,
}

/// `main` block of the upstream response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpstreamMain {
    /// Kelvin
    pub temp: Option<f64>,
    pub humidity: Option<i64>,
}
