use tracing::instrument;

use crate::api::actions::FavoriteTarget;
use crate::db::util::TimedClientExt;
use crate::db::{db_error, PgPool};

db_error!(FavoriteStorageError {});

/// Flip the favorite flag for `(user, target)`. The first toggle creates the
/// row as favorite; each further toggle inverts it, so calling twice always
/// restores the original state.
#[instrument(skip(pool))]
pub async fn toggle_favorite(
    pool: &PgPool,
    user_id: i64,
    target_id: i64,
    target_type: FavoriteTarget,
) -> Result<bool, FavoriteStorageError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_one_cached(
            "INSERT INTO prep.favorites (user_id, target_id, target_type, is_favorite)
             VALUES ($1, $2, $3, true)
             ON CONFLICT (user_id, target_id, target_type) DO UPDATE SET
                is_favorite = NOT prep.favorites.is_favorite,
                updated_at = NOW()
             RETURNING is_favorite",
            &[&user_id, &target_id, &target_type.as_ref()],
            "favorites.toggle",
        )
        .await?;

    Ok(row.get("is_favorite"))
}
