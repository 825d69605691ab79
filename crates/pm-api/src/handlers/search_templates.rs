use axum::{extract::State, Json};

use pm_common::api::actions::{CreateSearchTemplateRequest, CreateSearchTemplateResponse};
use pm_common::db::create_search_template;

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::handlers::{require_enterprise, require_user};
use crate::SharedState;

pub async fn create(
    State(state): State<SharedState>,
    session: SessionUser,
    Json(payload): Json<CreateSearchTemplateRequest>,
) -> Result<Json<CreateSearchTemplateResponse>, ApiError> {
    let user = require_user(&state, &session).await?;
    require_enterprise(&user)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }

    let template_id =
        create_search_template(&state.pool, user.id, payload.name.trim(), &payload.filters)
            .await?;

    Ok(Json(CreateSearchTemplateResponse {
        success: true,
        template_id,
    }))
}
