//! Database operations for `ingest_runs` and `ingest_run_sources`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ideaflow_ideas::SourceReport;

use crate::DbError;

/// A row from the `ingest_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub ideas_created: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `ingest_run_sources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunSourceRow {
    pub id: i64,
    pub ingest_run_id: i64,
    pub source: String,
    pub posts_found: i32,
    pub ideas_created: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creates a new run in `running` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn create_ingest_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<IngestRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, IngestRunRow>(
        "INSERT INTO ingest_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'running') \
         RETURNING id, public_id, trigger_source, status, started_at, completed_at, \
                   ideas_created, error_message, created_at",
    )
    .bind(public_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `completed` with its final created count.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the run id does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn complete_ingest_run(
    pool: &PgPool,
    run_id: i64,
    ideas_created: i32,
) -> Result<(), DbError> {
    let updated = sqlx::query(
        "UPDATE ingest_runs SET status = 'completed', ideas_created = $2, \
         completed_at = NOW() WHERE id = $1",
    )
    .bind(run_id)
    .bind(ideas_created)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the run id does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn fail_ingest_run(pool: &PgPool, run_id: i64, error: &str) -> Result<(), DbError> {
    let updated = sqlx::query(
        "UPDATE ingest_runs SET status = 'failed', error_message = $2, \
         completed_at = NOW() WHERE id = $1",
    )
    .bind(run_id)
    .bind(error)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Persist the per-source slices of a run report.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn record_source_reports(
    pool: &PgPool,
    run_id: i64,
    reports: &[SourceReport],
) -> Result<(), DbError> {
    for report in reports {
        sqlx::query(
            "INSERT INTO ingest_run_sources \
               (ingest_run_id, source, posts_found, ideas_created, error_message) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(run_id)
        .bind(&report.source)
        .bind(i32::try_from(report.found).unwrap_or(i32::MAX))
        .bind(i32::try_from(report.succeeded).unwrap_or(i32::MAX))
        .bind(report.error.as_deref())
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Most recent runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_ingest_runs(pool: &PgPool, limit: i64) -> Result<Vec<IngestRunRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestRunRow>(
        "SELECT id, public_id, trigger_source, status, started_at, completed_at, \
                ideas_created, error_message, created_at \
         FROM ingest_runs ORDER BY id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Per-source rows for one run, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_ingest_run_sources(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<IngestRunSourceRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestRunSourceRow>(
        "SELECT id, ingest_run_id, source, posts_found, ideas_created, error_message, created_at \
         FROM ingest_run_sources WHERE ingest_run_id = $1 ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
