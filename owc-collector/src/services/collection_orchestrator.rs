//! Collection orchestration
//!
//! Drives one job through its waves and produces the response body as a lazy
//! stream of text fragments. Concatenated, the fragments form one JSON
//! document:
//!
//! ```text
//! {"user_defined_id": "<key>", "request_datetime": "<rfc3339>", "city_info": [
//!   {"city_id":..,"temperature":..,"humidity":..}, ...
//! ]}
//! ```
//!
//! Per wave: fetch concurrently, merge into storage (one transaction), emit
//! the wave's records, then pace before the next wave. Waves are strictly
//! sequential. Dropping the stream stops the run at its next suspension
//! point; committed waves stay in storage and the job's lock entry is
//! released.

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::CollectionConfig;
use crate::error::CollectError;
use crate::models::CityRecord;
use crate::services::job_locks::JobLocks;
use crate::services::pacer::Pacer;
use crate::services::wave_fetcher::WaveFetcher;
use crate::services::waves::{wave_count, waves};
use crate::services::weather_client::WeatherSource;

/// Closing fragment of every successful run
pub const CLOSING_FRAGMENT: &str = "]}";

/// Runs collection jobs
#[derive(Clone)]
pub struct CollectionOrchestrator {
    db: SqlitePool,
    fetcher: WaveFetcher,
    pacer: Pacer,
    config: Arc<CollectionConfig>,
    locks: JobLocks,
}

impl CollectionOrchestrator {
    pub fn new(
        db: SqlitePool,
        source: Arc<dyn WeatherSource>,
        config: Arc<CollectionConfig>,
        locks: JobLocks,
    ) -> Self {
        Self {
            db,
            fetcher: WaveFetcher::new(source),
            pacer: Pacer::new(config.min_wave_duration),
            config,
            locks,
        }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Stream the collection of `job_key`, started at `request_datetime`
    ///
    /// Nothing runs until the stream is polled. A storage failure yields one
    /// `Err` and ends the stream without a closing fragment.
    pub fn run(
        &self,
        job_key: String,
        request_datetime: DateTime<Utc>,
    ) -> impl Stream<Item = Result<String, CollectError>> + Send + 'static {
        let this = self.clone();

        async_stream::try_stream! {
            let target_set = Arc::clone(&this.config.target_set);
            let width = this.config.wave_width;
            let total_waves = wave_count(target_set.len(), width);
            let _lease = this.locks.lease(&job_key);

            info!(
                job_key = %job_key,
                cities = target_set.len(),
                waves = total_waves,
                "Collection started"
            );

            yield opening_fragment(&job_key, &request_datetime);

            let mut emitted_any = false;
            let mut persisted = 0usize;

            for wave in waves(&target_set, width) {
                let timer = this.pacer.start();
                let outcome = this.fetcher.fetch(wave).await;

                persisted = {
                    let _guard = this.locks.lock(&job_key).await;
                    crate::db::jobs::append_records(
                        &this.db,
                        &job_key,
                        &request_datetime,
                        &outcome.records,
                    )
                    .await
                    .map_err(|e| {
                        error!(
                            job_key = %job_key,
                            wave = wave.index,
                            error = %e,
                            "Storage failure during merge, aborting collection"
                        );
                        CollectError::Storage(e)
                    })?
                };

                info!(
                    job_key = %job_key,
                    wave = wave.index + 1,
                    waves = total_waves,
                    collected = outcome.records.len(),
                    dropped = outcome.dropped,
                    persisted,
                    "Wave merged"
                );

                if let Some(fragment) = wave_fragment(&outcome.records, emitted_any) {
                    emitted_any = true;
                    yield fragment;
                }

                if wave.index + 1 < total_waves {
                    timer.finish().await;
                }
            }

            info!(job_key = %job_key, persisted, "Collection finished");

            yield CLOSING_FRAGMENT.to_string();
        }
    }
}

/// `{"user_defined_id": <key>, "request_datetime": <ts>, "city_info": [`
pub fn opening_fragment(job_key: &str, request_datetime: &DateTime<Utc>) -> String {
    let timestamp = owc_common::time::to_storage_string(request_datetime);
    format!(
        "{{\"user_defined_id\": {}, \"request_datetime\": {}, \"city_info\": [",
        serde_json::Value::from(job_key),
        serde_json::Value::from(timestamp)
    )
}

/// Comma-joined records of one wave; `None` for an empty wave
pub fn wave_fragment(records: &[CityRecord], after_previous: bool) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let mut fragment = String::new();
    if after_previous {
        fragment.push(',');
    }
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            fragment.push(',');
        }
        // CityRecord has only numeric fields; serialization cannot fail
        fragment.push_str(&serde_json::to_string(record).unwrap_or_default());
    }
    Some(fragment)
}
