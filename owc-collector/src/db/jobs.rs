//! Weather job persistence
//!
//! Point lookup, create, full-document overwrite, and the per-wave
//! load-append-save merge. The merge runs in one transaction so a wave is
//! committed entirely or not at all.

use chrono::{DateTime, Utc};
use owc_common::time::{parse_storage_string, to_storage_string};
use owc_common::{Error, Result};
use sqlx::{Row, SqlitePool};

use crate::models::{CityInfo, CityRecord, WeatherJob};
use crate::utils::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};

fn encode_city_info(info: &CityInfo) -> Result<String> {
    serde_json::to_string(info)
        .map_err(|e| Error::Internal(format!("Failed to serialize city_info: {}", e)))
}

fn decode_city_info(raw: &str) -> Result<CityInfo> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Internal(format!("Failed to deserialize city_info: {}", e)))
}

/// True if a job with this key exists
pub async fn job_exists(pool: &SqlitePool, user_defined_id: &str) -> Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM weather_jobs WHERE user_defined_id = ?")
            .bind(user_defined_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Insert a new job; `Error::Conflict` if the key is taken
pub async fn create_job(pool: &SqlitePool, job: &WeatherJob) -> Result<()> {
    let city_info = encode_city_info(&job.city_info)?;
    let request_datetime = to_storage_string(&job.request_datetime);

    let result = retry_on_lock("create_job", DEFAULT_MAX_LOCK_WAIT_MS, || async {
        sqlx::query(
            r#"
            INSERT INTO weather_jobs (user_defined_id, request_datetime, city_info)
            VALUES (?, ?, ?)
            ON CONFLICT(user_defined_id) DO NOTHING
            "#,
        )
        .bind(&job.user_defined_id)
        .bind(&request_datetime)
        .bind(&city_info)
        .execute(pool)
        .await
        .map_err(Error::Database)
    })
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Conflict(format!(
            "Job already exists: {}",
            job.user_defined_id
        )));
    }

    tracing::debug!(job_key = %job.user_defined_id, "Job created");
    Ok(())
}

/// Load a job by key
pub async fn load_job(pool: &SqlitePool, user_defined_id: &str) -> Result<Option<WeatherJob>> {
    let row = sqlx::query(
        r#"
        SELECT user_defined_id, request_datetime, city_info
        FROM weather_jobs
        WHERE user_defined_id = ?
        "#,
    )
    .bind(user_defined_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let request_datetime: String = row.get("request_datetime");
            let city_info: String = row.get("city_info");
            Ok(Some(WeatherJob {
                user_defined_id: row.get("user_defined_id"),
                request_datetime: parse_storage_string(&request_datetime)?,
                city_info: decode_city_info(&city_info)?,
            }))
        }
        None => Ok(None),
    }
}

/// Overwrite the whole job document (insert if absent)
pub async fn save_job(pool: &SqlitePool, job: &WeatherJob) -> Result<()> {
    let city_info = encode_city_info(&job.city_info)?;
    let request_datetime = to_storage_string(&job.request_datetime);

    retry_on_lock("save_job", DEFAULT_MAX_LOCK_WAIT_MS, || async {
        sqlx::query(
            r#"
            INSERT INTO weather_jobs (user_defined_id, request_datetime, city_info)
            VALUES (?, ?, ?)
            ON CONFLICT(user_defined_id) DO UPDATE SET
                request_datetime = excluded.request_datetime,
                city_info = excluded.city_info
            "#,
        )
        .bind(&job.user_defined_id)
        .bind(&request_datetime)
        .bind(&city_info)
        .execute(pool)
        .await
        .map_err(Error::Database)?;
        Ok::<(), Error>(())
    })
    .await
}

/// Append one wave of records to a job
///
/// Loads the current record list (creating the job with an empty list when
/// absent), appends `records`, and saves, inside a single transaction.
/// Returns the record count after the merge.
pub async fn append_records(
    pool: &SqlitePool,
    user_defined_id: &str,
    request_datetime: &DateTime<Utc>,
    records: &[CityRecord],
) -> Result<usize> {
    let request_datetime = to_storage_string(request_datetime);

    retry_on_lock("append_records", DEFAULT_MAX_LOCK_WAIT_MS, || async {
        let mut tx = pool.begin().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT city_info FROM weather_jobs WHERE user_defined_id = ?")
                .bind(user_defined_id)
                .fetch_optional(&mut *tx)
                .await?;

        let mut city_info = match existing {
            Some(raw) => decode_city_info(&raw)?,
            None => CityInfo::default(),
        };
        city_info.cities_info.extend_from_slice(records);
        let total = city_info.cities_info.len();
        let encoded = encode_city_info(&city_info)?;

        sqlx::query(
            r#"
            INSERT INTO weather_jobs (user_defined_id, request_datetime, city_info)
            VALUES (?, ?, ?)
            ON CONFLICT(user_defined_id) DO UPDATE SET city_info = excluded.city_info
            "#,
        )
        .bind(user_defined_id)
        .bind(&request_datetime)
        .bind(&encoded)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok::<usize, Error>(total)
    })
    .await
}
