//! Job progress reporting
//!
//! Reads whatever the last committed wave left in storage; never coordinates
//! with a running collection.

use owc_common::Result;
use sqlx::SqlitePool;

use crate::services::temperature::round2;

/// Completion of a job against the target set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub collected: usize,
    pub total: usize,
}

impl Progress {
    /// Percentage rounded to two decimals
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round2(self.collected as f64 / self.total as f64 * 100.0)
    }

    /// Status string such as `"0.0%"`, `"33.33%"` or `"100.0%"`
    pub fn status(&self) -> String {
        let percentage = self.percentage();
        if percentage.fract() == 0.0 {
            format!("{:.1}%", percentage)
        } else {
            format!("{}%", percentage)
        }
    }
}

/// Progress of a job, `None` when the key is unknown
pub async fn job_progress(
    pool: &SqlitePool,
    user_defined_id: &str,
    target_set_len: usize,
) -> Result<Option<Progress>> {
    let job = crate::db::jobs::load_job(pool, user_defined_id).await?;
    Ok(job.map(|job| Progress {
        collected: job.collected(),
        total: target_set_len,
    }))
}
