use axum::{extract::State, Json};
use chrono::{DateTime, Utc};

use pm_common::api::actions::{ScheduleMeetingRequest, ScheduleMeetingResponse};
use pm_common::api::interview::QuizListResponse;
use pm_common::db::{list_quizzes, schedule_interview_meeting};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::handlers::require_user;
use crate::SharedState;

pub async fn list_interviews(
    State(state): State<SharedState>,
    session: SessionUser,
) -> Result<Json<QuizListResponse>, ApiError> {
    require_user(&state, &session).await?;

    let quizzes = list_quizzes(&state.pool).await?;
    Ok(Json(QuizListResponse {
        success: true,
        quizzes,
    }))
}

pub async fn schedule_meeting(
    State(state): State<SharedState>,
    session: SessionUser,
    Json(payload): Json<ScheduleMeetingRequest>,
) -> Result<Json<ScheduleMeetingResponse>, ApiError> {
    let user = require_user(&state, &session).await?;

    // Parse before touching the store; a bad date must never reach a write.
    let scheduled_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&payload.scheduled_at)
        .map_err(|err| {
            ApiError::BadRequest(format!(
                "scheduledAt is not a valid RFC 3339 date-time: {err}"
            ))
        })?
        .with_timezone(&Utc);

    let meeting_id = schedule_interview_meeting(
        &state.pool,
        user.id,
        payload.application_id,
        scheduled_at,
        payload.meeting_url.as_deref(),
    )
    .await?;

    Ok(Json(ScheduleMeetingResponse {
        success: true,
        meeting_id,
        scheduled_at,
    }))
}
