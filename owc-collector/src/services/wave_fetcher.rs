//! Concurrent wave fetching
//!
//! All requests of a wave run concurrently and the wave returns only after
//! every request resolved. Per-city error isolation: a failed request or a
//! malformed payload drops that city and never fails the wave.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::CityRecord;
use crate::services::normalizer::normalize;
use crate::services::waves::Wave;
use crate::services::weather_client::WeatherSource;

/// Result of one wave
#[derive(Debug, Clone, PartialEq)]
pub struct WaveOutcome {
    /// Normalized records, in submission order
    pub records: Vec<CityRecord>,
    /// Cities dropped because of upstream or shape errors
    pub dropped: usize,
}

/// Issues the requests of one wave concurrently
#[derive(Clone)]
pub struct WaveFetcher {
    source: Arc<dyn WeatherSource>,
}

impl WaveFetcher {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }

    /// Fetch and normalize every city of the wave
    pub async fn fetch(&self, wave: Wave<'_>) -> WaveOutcome {
        let wave_index = wave.index;
        let requests = wave.city_ids.iter().map(|&city_id| {
            let source = Arc::clone(&self.source);
            async move {
                let observation = match source.current_weather(city_id).await {
                    Ok(observation) => observation,
                    Err(e) => {
                        warn!(
                            wave = wave_index,
                            city_id,
                            error = %e,
                            "Upstream request failed, dropping city from wave"
                        );
                        return None;
                    }
                };

                match normalize(&observation) {
                    Ok(record) => {
                        debug!(wave = wave_index, city_id, "City observation collected");
                        Some(record)
                    }
                    Err(e) => {
                        warn!(
                            wave = wave_index,
                            city_id,
                            error = %e,
                            "Malformed upstream payload, dropping city from wave"
                        );
                        None
                    }
                }
            }
        });

        let results = join_all(requests).await;
        let requested = results.len();
        let records: Vec<CityRecord> = results.into_iter().flatten().collect();

        WaveOutcome {
            dropped: requested - records.len(),
            records,
        }
    }
}
