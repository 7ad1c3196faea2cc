//! Collection pipeline services
//!
//! Leaves first: temperature conversion, payload normalization, wave
//! chunking, upstream client, wave fetching, pacing, orchestration, progress.

pub mod collection_orchestrator;
pub mod job_locks;
pub mod normalizer;
pub mod pacer;
pub mod progress;
pub mod temperature;
pub mod wave_fetcher;
pub mod waves;
pub mod weather_client;

pub use collection_orchestrator::{CollectionOrchestrator, CLOSING_FRAGMENT};
pub use job_locks::{JobLease, JobLocks};
pub use normalizer::normalize;
pub use pacer::{Pacer, WaveTimer};
pub use progress::{job_progress, Progress};
pub use temperature::to_celsius;
pub use wave_fetcher::{WaveFetcher, WaveOutcome};
pub use waves::{waves, Wave};
pub use weather_client::{OpenWeatherClient, UpstreamError, WeatherSource};
