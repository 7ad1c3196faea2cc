//! Test Helper Utilities
//!
//! Shared harness for the owc-collector integration tests: a temp-file
//! database, a scripted upstream, and a small collection configuration.

#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use owc_collector::config::CollectionConfig;
use owc_collector::models::{UpstreamMain, UpstreamObservation};
use owc_collector::services::{CollectionOrchestrator, JobLocks, UpstreamError, WeatherSource};
use owc_collector::{build_router, AppState};

/// Upstream stand-in
///
/// City `n` reports `273.15 + n` Kelvin (so `n` °C) and humidity `n % 100`.
#[derive(Default)]
pub struct ScriptedSource {
    calls: AtomicUsize,
    failing: HashSet<i64>,
    malformed: HashSet<i64>,
    out_of_range: HashSet<i64>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cities answered with a network error
    pub fn failing(mut self, city_ids: &[i64]) -> Self {
        self.failing.extend(city_ids);
        self
    }

    /// Cities answered without `main.temp`
    pub fn malformed(mut self, city_ids: &[i64]) -> Self {
        self.malformed.extend(city_ids);
        self
    }

    /// Cities answered with a temperature too large to round
    pub fn out_of_range(mut self, city_ids: &[i64]) -> Self {
        self.out_of_range.extend(city_ids);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for ScriptedSource {
    async fn current_weather(&self, city_id: i64) -> Result<UpstreamObservation, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&city_id) {
            return Err(UpstreamError::Network("connection refused".to_string()));
        }

        let temp = if self.malformed.contains(&city_id) {
            None
        } else if self.out_of_range.contains(&city_id) {
            Some(1e307)
        } else {
            Some(273.15 + city_id as f64)
        };

        Ok(UpstreamObservation {
            id: Some(city_id),
            main: Some(UpstreamMain {
                temp,
                humidity: Some(city_id % 100),
            }),
        })
    }
}

/// Everything a test needs; the temp dir lives as long as the harness
pub struct TestHarness {
    _dir: TempDir,
    pub pool: SqlitePool,
    pub source: Arc<ScriptedSource>,
    pub locks: JobLocks,
    pub orchestrator: CollectionOrchestrator,
}

impl TestHarness {
    pub fn state(&self) -> AppState {
        AppState::new(self.pool.clone(), self.orchestrator.clone())
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.state())
    }
}

/// Cities `1..=count`
pub fn city_ids(count: i64) -> Vec<i64> {
    (1..=count).collect()
}

pub fn test_config(target_set: Vec<i64>, wave_width: usize, min_wave_duration: Duration) -> CollectionConfig {
    CollectionConfig {
        api_key: "test-key".to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
        target_set: target_set.into(),
        wave_width: NonZeroUsize::new(wave_width).unwrap(),
        min_wave_duration,
        request_timeout: Duration::from_secs(1),
    }
}

/// Harness over a fresh database file
pub async fn harness(source: ScriptedSource, config: CollectionConfig) -> TestHarness {
    let dir = TempDir::new().unwrap();
    let pool = owc_collector::db::init_database_pool(&dir.path().join("owc.db"))
        .await
        .unwrap();

    let source = Arc::new(source);
    let locks = JobLocks::new();
    let orchestrator = CollectionOrchestrator::new(
        pool.clone(),
        source.clone(),
        Arc::new(config),
        locks.clone(),
    );

    TestHarness {
        _dir: dir,
        pool,
        source,
        locks,
        orchestrator,
    }
}
