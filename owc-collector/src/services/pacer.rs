//! Per-wave pacing
//!
//! Every wave consumes at least `min_wave_duration` of wall clock, measured
//! from dispatch. Fast waves are padded with a sleep; slow waves are not
//! shortened.

use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum duration per wave
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min_wave_duration: Duration,
}

/// Started wave; finish it to apply the pacing delay
#[derive(Debug)]
pub struct WaveTimer {
    started: Instant,
    min_wave_duration: Duration,
}

impl Pacer {
    pub fn new(min_wave_duration: Duration) -> Self {
        Self { min_wave_duration }
    }

    /// Record the dispatch time of a wave
    pub fn start(&self) -> WaveTimer {
        WaveTimer {
            started: Instant::now(),
            min_wave_duration: self.min_wave_duration,
        }
    }
}

impl WaveTimer {
    /// Delay still owed for this wave
    pub fn remaining(&self) -> Duration {
        self.min_wave_duration.saturating_sub(self.started.elapsed())
    }

    /// Sleep for `max(0, min_wave_duration - elapsed)`
    pub async fn finish(self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            tracing::debug!(
                sleep_ms = remaining.as_millis() as u64,
                "Pacing: waiting before next wave"
            );
            tokio::time::sleep(remaining).await;
        }
    }
}
