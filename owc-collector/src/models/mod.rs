//! Data models for owc-collector

pub mod upstream;
pub mod weather_job;

pub use upstream::{UpstreamMain, UpstreamObservation};
pub use weather_job::{CityInfo, CityRecord, WeatherJob};
