use tracing::instrument;

use crate::api::recommendation::{RecommendationDraft, RecommendationDto, RecommendationKind};
use crate::db::util::TimedClientExt;
use crate::db::{db_error, PgPool};

db_error!(RecommendationStorageError {
    #[error("failed to map recommendation row: {0}")]
    Mapping(String),
});

/// Replace the user's generated-but-unviewed recommendations with a fresh
/// batch. Viewed rows are history and stay untouched.
#[instrument(skip(pool, drafts))]
pub async fn replace_generated_recommendations(
    pool: &PgPool,
    user_id: i64,
    drafts: &[RecommendationDraft],
) -> Result<u64, RecommendationStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    tx.execute(
        "DELETE FROM prep.recommendations WHERE user_id = $1 AND viewed = false",
        &[&user_id],
    )
    .await?;

    let stmt = tx
        .prepare_cached(
            "INSERT INTO prep.recommendations (user_id, kind, message, priority, viewed)
             VALUES ($1, $2, $3, $4, false)",
        )
        .await?;

    let mut written = 0u64;
    for draft in drafts {
        written += tx
            .execute(
                &stmt,
                &[
                    &draft.user_id,
                    &draft.kind.as_ref(),
                    &draft.message,
                    &draft.priority,
                ],
            )
            .await?;
    }

    tx.commit().await?;
    Ok(written)
}

#[instrument(skip(pool))]
pub async fn fetch_user_recommendations(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<RecommendationDto>, RecommendationStorageError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT id, kind, message, priority, viewed, created_at
             FROM prep.recommendations
             WHERE user_id = $1
             ORDER BY viewed ASC, priority DESC, created_at DESC",
            &[&user_id],
            "recommendations.fetch_for_user",
        )
        .await?;

    rows.into_iter()
        .map(|row| {
            let kind_raw: String = row.get("kind");
            let kind = RecommendationKind::parse(&kind_raw).ok_or_else(|| {
                RecommendationStorageError::Mapping(format!("unknown kind: {kind_raw}"))
            })?;

            Ok(RecommendationDto {
                id: row.get("id"),
                kind,
                message: row.get("message"),
                priority: row.get("priority"),
                viewed: row.get("viewed"),
                created_at: row.get("created_at"),
            })
        })
        .collect()
}

/// Returns false when the row does not exist or belongs to another user.
#[instrument(skip(pool))]
pub async fn mark_recommendation_viewed(
    pool: &PgPool,
    user_id: i64,
    recommendation_id: i64,
) -> Result<bool, RecommendationStorageError> {
    let client = pool.get().await?;

    let rows = client
        .timed_execute_cached(
            "UPDATE prep.recommendations SET viewed = true
             WHERE id = $1 AND user_id = $2",
            &[&recommendation_id, &user_id],
            "recommendations.mark_viewed",
        )
        .await?;

    Ok(rows > 0)
}
