//! Upstream payload normalization
//!
//! Maps one raw upstream observation to a [`CityRecord`]. Missing fields are
//! reported, never defaulted.

use crate::error::CollectError;
use crate::models::{CityRecord, UpstreamObservation};
use crate::services::temperature::to_celsius;

/// Build a city record from an upstream observation
pub fn normalize(observation: &UpstreamObservation) -> Result<CityRecord, CollectError> {
    let city_id = observation
        .id
        .ok_or(CollectError::MalformedUpstreamResponse("id"))?;
    let main = observation
        .main
        .as_ref()
        .ok_or(CollectError::MalformedUpstreamResponse("main"))?;
    let temp = main
        .temp
        .ok_or(CollectError::MalformedUpstreamResponse("main.temp"))?;
    let humidity = main
        .humidity
        .ok_or(CollectError::MalformedUpstreamResponse("main.humidity"))?;

    // Non-finite values would be persisted as JSON null
    let temperature = Some(temp)
        .filter(|t| t.is_finite())
        .map(to_celsius)
        .filter(|t| t.is_finite())
        .ok_or(CollectError::MalformedUpstreamResponse("main.temp"))?;

    Ok(CityRecord {
        city_id,
        temperature,
        humidity,
    })
}
