//! GET /api/v1/ideas — filtered, ranked idea listing.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ideaflow_ideas::{rank, SortStrategy};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

/// Upper bound on rows pulled for ranking. The limit applies after the sort,
/// so the scan has to be wider than any single page.
const RANK_SCAN_CAP: i64 = 500;

#[derive(Debug, Serialize)]
pub(super) struct IdeaItem {
    pub id: Uuid,
    pub problem: String,
    pub description: Option<String>,
    pub category: String,
    pub reddit_url: String,
    pub pain_score: i32,
    pub validation_score: i64,
    pub upvotes: i64,
    pub reddit_upvotes: i64,
    pub reddit_comments: i64,
    pub analyzed: bool,
    pub ai_analysis: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ideaflow_db::IdeaRow> for IdeaItem {
    fn from(row: ideaflow_db::IdeaRow) -> Self {
        Self {
            id: row.public_id,
            problem: row.problem,
            description: row.description,
            category: row.category,
            reddit_url: row.reddit_url,
            pain_score: row.pain_score,
            validation_score: row.validation_score,
            upvotes: row.upvotes,
            reddit_upvotes: row.reddit_upvotes,
            reddit_comments: row.reddit_comments,
            analyzed: row.analyzed,
            ai_analysis: row.ai_analysis,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct IdeasQuery {
    pub category: Option<String>,
    pub sort: Option<SortStrategy>,
    pub limit: Option<i64>,
}

pub(super) async fn list_ideas(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<IdeasQuery>,
) -> Result<Json<ApiResponse<Vec<IdeaItem>>>, ApiError> {
    let mut rows = ideaflow_db::list_ideas(&state.pool, query.category.as_deref(), RANK_SCAN_CAP)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    rank(&mut rows, query.sort.unwrap_or_default());
    rows.truncate(usize::try_from(normalize_limit(query.limit)).unwrap_or(20));

    let data = rows.into_iter().map(IdeaItem::from).collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
