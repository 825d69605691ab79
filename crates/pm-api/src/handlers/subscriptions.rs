use axum::{extract::State, Json};
use chrono::Utc;

use pm_common::api::actions::{SubscribeRequest, SubscribeResponse, SubscriptionDto};
use pm_common::db::subscribe_user;
use pm_common::subscription::Tier;

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::handlers::require_user;
use crate::SharedState;

pub async fn subscribe(
    State(state): State<SharedState>,
    session: SessionUser,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    let user = require_user(&state, &session).await?;

    if payload.payment_method.trim().is_empty() {
        return Err(ApiError::BadRequest("paymentMethod is required".into()));
    }

    let tier = Tier::parse(&payload.tier)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown tier: {}", payload.tier)))?;

    let subscription = subscribe_user(
        &state.pool,
        user.id,
        tier,
        &payload.payment_method,
        Utc::now(),
    )
    .await?;

    Ok(Json(SubscribeResponse {
        success: true,
        subscription: SubscriptionDto {
            tier: subscription.tier.as_str().to_string(),
            credits: subscription.credits,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
        },
    }))
}
