use axum::{extract::State, Json};

use pm_common::api::actions::{ToggleFavoriteRequest, ToggleFavoriteResponse};
use pm_common::db::toggle_favorite;

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::handlers::require_user;
use crate::SharedState;

pub async fn toggle(
    State(state): State<SharedState>,
    session: SessionUser,
    Json(payload): Json<ToggleFavoriteRequest>,
) -> Result<Json<ToggleFavoriteResponse>, ApiError> {
    let user = require_user(&state, &session).await?;

    let is_favorite = toggle_favorite(
        &state.pool,
        user.id,
        payload.target_id,
        payload.target_type,
    )
    .await?;

    Ok(Json(ToggleFavoriteResponse {
        success: true,
        is_favorite,
    }))
}
