use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use pm_common::api::reputation::{LeaderboardEntry, LeaderboardResponse, ReputationResponse};
use pm_common::db::{fetch_quiz_aggregates, fetch_user_names, fetch_user_quiz_aggregate};
use pm_common::reputation::{compute_ranks, level_for_experience};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::handlers::require_user;
use crate::SharedState;

#[derive(Debug, Deserialize, Default)]
pub struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

const fn default_limit() -> u32 {
    20
}

pub async fn my_reputation(
    State(state): State<SharedState>,
    session: SessionUser,
) -> Result<Json<ReputationResponse>, ApiError> {
    let user = require_user(&state, &session).await?;

    let aggregate = fetch_user_quiz_aggregate(&state.pool, user.id).await?;
    let all = fetch_quiz_aggregates(&state.pool).await?;
    let rank = compute_ranks(all)
        .into_iter()
        .find(|(user_id, _)| *user_id == user.id)
        .map(|(_, reputation)| reputation.rank)
        // users with no quiz results share the slot after every ranked user
        .unwrap_or(0);

    Ok(Json(ReputationResponse {
        success: true,
        experience: aggregate.total_score,
        level: level_for_experience(aggregate.total_score),
        rank,
        quizzes_taken: aggregate.quizzes_taken,
    }))
}

pub async fn leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
    session: SessionUser,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    require_user(&state, &session).await?;

    let limit = query.limit.clamp(1, 100) as usize;

    let ranked = compute_ranks(fetch_quiz_aggregates(&state.pool).await?);
    let top: Vec<_> = ranked.into_iter().take(limit).collect();

    let ids: Vec<i64> = top.iter().map(|(user_id, _)| *user_id).collect();
    let names = fetch_user_names(&state.pool, &ids).await?;

    let entries = top
        .into_iter()
        .map(|(user_id, reputation)| LeaderboardEntry {
            user_id,
            name: names.get(&user_id).cloned().unwrap_or_default(),
            experience: reputation.experience,
            level: reputation.level,
            rank: reputation.rank,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        success: true,
        entries,
    }))
}
