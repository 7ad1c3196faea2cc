//! Weather collection job document
//!
//! One row per caller-supplied job key. `city_info` mirrors the stored JSON
//! document: `{"cities_info": [CityRecord, ...]}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One city's normalized observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    /// Upstream city identifier
    pub city_id: i64,
    /// Degrees Celsius, rounded to two decimals
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: i64,
}

/// Accumulated records of a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    pub cities_info: Vec<CityRecord>,
}

/// Persisted collection job
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherJob {
    /// Caller-supplied job key
    pub user_defined_id: String,
    /// Set once when the job starts
    pub request_datetime: DateTime<Utc>,
    pub city_info: CityInfo,
}

impl WeatherJob {
    /// New job with an empty record list
    pub fn new(user_defined_id: impl Into<String>, request_datetime: DateTime<Utc>) -> Self {
        Self {
            user_defined_id: user_defined_id.into(),
            request_datetime,
            city_info: CityInfo::default(),
        }
    }

    /// Number of cities collected so far
    pub fn collected(&self) -> usize {
        self.city_info.cities_info.len()
    }
}
