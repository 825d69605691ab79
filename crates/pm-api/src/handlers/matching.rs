use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use pm_common::api::matching_cache::{
    GenerateResponse, MatchingCacheResponse, MAX_CACHED_MATCHES,
};
use pm_common::db::{
    fetch_cached_matches, fetch_candidate_pool, fetch_job_posting, upsert_candidate_matching,
    CandidateMatchingInsert,
};
use pm_common::matching::ScoreEngine;
use pm_common::{JobPosting, User};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::handlers::{require_enterprise, require_user};
use crate::SharedState;

#[derive(Debug, Deserialize, Default)]
pub struct MatchingQuery {
    #[serde(rename = "jobPostingId")]
    pub job_posting_id: Option<i64>,
}

/// Shared authorization chain for both matching routes. Order matters and is
/// part of the contract: session resolution (401), role (403), parameter
/// presence (400), ownership (403).
async fn authorize_posting(
    state: &SharedState,
    session: &SessionUser,
    query: &MatchingQuery,
) -> Result<(User, JobPosting), ApiError> {
    let user = require_user(state, session).await?;
    require_enterprise(&user)?;

    let job_posting_id = query
        .job_posting_id
        .ok_or_else(|| ApiError::BadRequest("jobPostingId is required".into()))?;

    let posting = fetch_job_posting(&state.pool, job_posting_id)
        .await?
        .filter(|posting| posting.enterprise_id == user.id)
        .ok_or_else(|| ApiError::Forbidden("job posting is not owned by the caller".into()))?;

    Ok((user, posting))
}

/// Pure read over the batch-written cache; never computes anything.
pub async fn cached_matches(
    State(state): State<SharedState>,
    Query(query): Query<MatchingQuery>,
    session: SessionUser,
) -> Result<Json<MatchingCacheResponse>, ApiError> {
    let (_, posting) = authorize_posting(&state, &session, &query).await?;

    let rows = fetch_cached_matches(
        &state.pool,
        posting.id.unwrap_or_default(),
        MAX_CACHED_MATCHES as i64,
    )
    .await?;

    Ok(Json(MatchingCacheResponse::from_rows(rows, Utc::now())))
}

/// Synchronous recompute for one posting. Overlapping calls for the same
/// posting race on the upserts; last writer wins.
pub async fn regenerate_matches(
    State(state): State<SharedState>,
    Query(query): Query<MatchingQuery>,
    session: SessionUser,
) -> Result<Json<GenerateResponse>, ApiError> {
    let (_, posting) = authorize_posting(&state, &session, &query).await?;

    let candidates = fetch_candidate_pool(&state.pool).await?;

    let mut rows_written = 0u64;
    for candidate in &candidates {
        let score = state.score_engine.score(&posting, candidate);
        let insert = CandidateMatchingInsert {
            job_posting_id: posting.id.unwrap_or_default(),
            candidate_id: candidate.id.unwrap_or_default(),
            match_score: score.total,
            skills_match: score.skills.score,
            domain_match: score.domains.score,
            experience_match: score.experience.score,
            ai_reason: score.reason(),
            computed_at: None,
        };
        rows_written += upsert_candidate_matching(&state.pool, &insert).await?;
    }

    Ok(Json(GenerateResponse {
        success: true,
        rows_written,
        timestamp: Utc::now(),
    }))
}
