//! POST /api/v1/ideas/{id}/analyze — best-effort LLM enrichment.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use ideaflow_analyzer::AnalyzerClient;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeResponse {
    pub id: Uuid,
    pub analyzed: bool,
    pub analysis: serde_json::Value,
}

pub(super) async fn analyze_idea(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(idea_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AnalyzeResponse>>, ApiError> {
    let idea = ideaflow_db::get_idea(&state.pool, idea_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "idea not found"))?;

    let Some(api_key) = state.config.anthropic_api_key.as_deref() else {
        return Err(ApiError::new(
            req_id.0,
            "internal_error",
            "Anthropic API key not configured",
        ));
    };

    let client = AnalyzerClient::new(api_key, state.config.fetch_request_timeout_secs)
        .map_err(|e| {
            tracing::error!(error = %e, "analyzer client construction failed");
            ApiError::new(req_id.0.clone(), "internal_error", "analyzer unavailable")
        })?;

    match client
        .analyze_idea(
            &idea.problem,
            idea.description.as_deref(),
            idea.reddit_upvotes,
            idea.reddit_comments,
        )
        .await
    {
        Ok(analysis) => {
            let json = serde_json::to_value(&analysis).map_err(|e| {
                tracing::error!(error = %e, "analysis serialization failed");
                ApiError::new(req_id.0.clone(), "internal_error", "analysis failed")
            })?;

            let updated = ideaflow_db::set_idea_analysis(&state.pool, idea_id, Some(&json))
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

            Ok(Json(ApiResponse {
                data: AnalyzeResponse {
                    id: updated.public_id,
                    analyzed: updated.analyzed,
                    analysis: json,
                },
                meta: ResponseMeta::new(req_id.0),
            }))
        }
        Err(e) => {
            tracing::warn!(idea = %idea_id, error = %e, "enrichment failed");
            // Flag the attempt so the idea is not retried forever; the idea
            // itself is untouched — enrichment is never required for it to exist.
            if let Err(db_err) = ideaflow_db::set_idea_analysis(&state.pool, idea_id, None).await {
                tracing::warn!(idea = %idea_id, error = %db_err, "failed to flag analysis attempt");
            }
            Err(ApiError::new(
                req_id.0,
                "internal_error",
                "failed to analyze idea",
            ))
        }
    }
}
