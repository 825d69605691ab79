use deadpool_postgres::GenericClient;
use tracing::instrument;

use crate::api::interview::QuizSummary;
use crate::db::util::TimedClientExt;
use crate::db::{db_error, PgPool};
use crate::reputation::QuizAggregate;

db_error!(QuizStoreError {});

/// Quiz listing with selected fields only.
#[instrument(skip(pool))]
pub async fn list_quizzes(pool: &PgPool) -> Result<Vec<QuizSummary>, QuizStoreError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT id, title, domain, difficulty, duration_minutes, created_at
             FROM prep.job_quizzes
             ORDER BY created_at DESC",
            &[],
            "quizzes.list",
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| QuizSummary {
            id: row.get("id"),
            title: row.get("title"),
            domain: row.get("domain"),
            difficulty: row.get("difficulty"),
            duration_minutes: row.get("duration_minutes"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Per-user sums over quiz_results, the raw input of the reputation ranking.
#[instrument(skip(pool))]
pub async fn fetch_quiz_aggregates(pool: &PgPool) -> Result<Vec<QuizAggregate>, QuizStoreError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT user_id, COALESCE(SUM(score), 0)::BIGINT AS total_score, COUNT(*) AS taken
             FROM prep.quiz_results
             GROUP BY user_id",
            &[],
            "quizzes.aggregates",
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| QuizAggregate {
            user_id: row.get("user_id"),
            total_score: row.get("total_score"),
            quizzes_taken: row.get("taken"),
        })
        .collect())
}

#[instrument(skip(pool))]
pub async fn fetch_user_quiz_aggregate(
    pool: &PgPool,
    user_id: i64,
) -> Result<QuizAggregate, QuizStoreError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_one_cached(
            "SELECT COALESCE(SUM(score), 0)::BIGINT AS total_score, COUNT(*) AS taken
             FROM prep.quiz_results
             WHERE user_id = $1",
            &[&user_id],
            "quizzes.user_aggregate",
        )
        .await?;

    Ok(QuizAggregate {
        user_id,
        total_score: row.get("total_score"),
        quizzes_taken: row.get("taken"),
    })
}

/// Number of quizzes attached to the posting the candidate has not yet
/// passed. Zero means the technical-test gate is open.
pub async fn count_incomplete_quizzes(
    client: &impl GenericClient,
    job_posting_id: i64,
    candidate_id: i64,
) -> Result<i64, tokio_postgres::Error> {
    let row = client
        .timed_query_one_cached(
            "SELECT COUNT(*) AS remaining
             FROM prep.job_quizzes q
             WHERE q.job_posting_id = $1
               AND NOT EXISTS (
                   SELECT 1 FROM prep.quiz_results r
                   WHERE r.quiz_id = q.id AND r.user_id = $2 AND r.passed
               )",
            &[&job_posting_id, &candidate_id],
            "quizzes.count_incomplete",
        )
        .await?;

    Ok(row.get("remaining"))
}
