use axum::{
    extract::{Path, State},
    Json,
};

use pm_common::api::recommendation::RecommendationsResponse;
use pm_common::db::{fetch_user_recommendations, mark_recommendation_viewed};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::handlers::require_user;
use crate::SharedState;

pub async fn get_recommendations(
    State(state): State<SharedState>,
    session: SessionUser,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let user = require_user(&state, &session).await?;

    let recommendations = fetch_user_recommendations(&state.pool, user.id).await?;
    Ok(Json(RecommendationsResponse {
        success: true,
        recommendations,
    }))
}

pub async fn mark_viewed(
    State(state): State<SharedState>,
    Path(recommendation_id): Path<i64>,
    session: SessionUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, &session).await?;

    let found = mark_recommendation_viewed(&state.pool, user.id, recommendation_id).await?;
    if !found {
        return Err(ApiError::NotFound(format!(
            "recommendation {recommendation_id} not found"
        )));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
