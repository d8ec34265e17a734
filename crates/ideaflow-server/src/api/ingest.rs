//! POST /api/v1/ingest — run the ingestion pipeline once.
//!
//! The endpoint is the job trigger: an external scheduler (or an operator)
//! calls it; the server owns no timer loop. Each call is recorded as an
//! `ingest_runs` row with its per-source results.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ideaflow_ideas::{IngestOptions, IngestReport, ProblemLexicon, SourceReport, TimeWindow};
use ideaflow_reddit::{RedditClient, RedditCredentials};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct IngestRequest {
    pub sources: Option<Vec<String>>,
    pub time_window: Option<TimeWindow>,
    pub post_limit: Option<u32>,
    pub min_upvotes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct IngestResponse {
    pub run_id: Uuid,
    pub created: usize,
    pub per_source: Vec<SourceReport>,
}

pub(super) async fn trigger_ingest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<IngestResponse>>, ApiError> {
    // The body is optional: an empty POST runs with the configured defaults.
    let request: IngestRequest = if body.is_empty() {
        IngestRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("invalid request body: {e}"),
            )
        })?
    };
    let config = &state.config;

    let (Some(client_id), Some(client_secret)) = (
        config.reddit_client_id.clone(),
        config.reddit_client_secret.clone(),
    ) else {
        return Err(ApiError::new(
            req_id.0,
            "internal_error",
            "Reddit API credentials not configured",
        ));
    };

    let sources = request
        .sources
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.sources.sources.clone());

    let options = IngestOptions {
        time_window: request.time_window.unwrap_or(TimeWindow::Day),
        post_limit: request.post_limit.unwrap_or(config.ingest_post_limit),
        min_upvotes: request.min_upvotes.unwrap_or(config.ingest_min_upvotes),
        inter_source_delay: Duration::from_millis(config.ingest_inter_source_delay_ms),
        ..IngestOptions::default()
    };

    let run = ideaflow_db::create_ingest_run(&state.pool, "api")
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let credentials = RedditCredentials {
        client_id,
        client_secret,
        user_agent: config.reddit_user_agent.clone(),
    };

    let client = match RedditClient::new(&credentials, config.fetch_request_timeout_secs).await {
        Ok(client) => client
            .with_retry_policy(config.fetch_max_retries, config.fetch_retry_backoff_base_ms),
        Err(e) => {
            tracing::error!(error = %e, "Reddit client construction failed");
            let _ = ideaflow_db::fail_ingest_run(&state.pool, run.id, &e.to_string()).await;
            return Err(ApiError::new(
                req_id.0,
                "internal_error",
                "failed to authenticate with Reddit",
            ));
        }
    };

    let store = ideaflow_db::PgIdeaStore::new(state.pool.clone());
    let lexicon = ProblemLexicon::default();

    match ideaflow_ideas::ingest(&client, &store, &lexicon, &sources, &options).await {
        Ok(report) => {
            persist_report(&state, run.id, &report).await;
            Ok(Json(ApiResponse {
                data: IngestResponse {
                    run_id: run.public_id,
                    created: report.created,
                    per_source: report.per_source,
                },
                meta: ResponseMeta::new(req_id.0),
            }))
        }
        Err(e) => {
            tracing::error!(error = %e, "ingestion run failed");
            let _ = ideaflow_db::fail_ingest_run(&state.pool, run.id, &e.to_string()).await;
            Err(ApiError::new(req_id.0, "internal_error", e.to_string()))
        }
    }
}

/// Best-effort bookkeeping: a failure to persist the report must not turn a
/// successful run into an API error.
async fn persist_report(state: &AppState, run_id: i64, report: &IngestReport) {
    if let Err(e) = ideaflow_db::record_source_reports(&state.pool, run_id, &report.per_source).await
    {
        tracing::warn!(error = %e, run_id, "failed to record per-source reports");
    }
    let created = i32::try_from(report.created).unwrap_or(i32::MAX);
    if let Err(e) = ideaflow_db::complete_ingest_run(&state.pool, run_id, created).await {
        tracing::warn!(error = %e, run_id, "failed to mark ingest run completed");
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunSourceItem {
    pub source: String,
    pub posts_found: i32,
    pub ideas_created: i32,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunItem {
    pub id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub ideas_created: i32,
    pub error_message: Option<String>,
    pub sources: Vec<RunSourceItem>,
}

pub(super) async fn list_ingest_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<RunItem>>>, ApiError> {
    let runs = ideaflow_db::list_ingest_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut data = Vec::with_capacity(runs.len());
    for run in runs {
        let sources = ideaflow_db::list_ingest_run_sources(&state.pool, run.id)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?
            .into_iter()
            .map(|s| RunSourceItem {
                source: s.source,
                posts_found: s.posts_found,
                ideas_created: s.ideas_created,
                error_message: s.error_message,
            })
            .collect();

        data.push(RunItem {
            id: run.public_id,
            trigger_source: run.trigger_source,
            status: run.status,
            started_at: run.started_at,
            completed_at: run.completed_at,
            ideas_created: run.ideas_created,
            error_message: run.error_message,
            sources,
        });
    }

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
