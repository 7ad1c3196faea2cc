//! HTTP API handlers for owc-collector

pub mod collect;
pub mod health;
pub mod progress;

pub use collect::collect_routes;
pub use health::health_routes;
pub use progress::progress_routes;
