use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::db::{db_error, PgPool};
use crate::subscription::{reconcile, SubscriptionState, Tier};

db_error!(SubscriptionStorageError {
    #[error("user not found: {0}")]
    UserNotFound(i64),
    #[error("failed to map subscription row: {0}")]
    Mapping(String),
});

/// Reconcile the requested tier against the stored subscription and apply the
/// outcome. The subscription upsert and the user's credit balance move in ONE
/// transaction; there is no observable state where the two disagree.
#[instrument(skip(pool))]
pub async fn subscribe_user(
    pool: &PgPool,
    user_id: i64,
    tier: Tier,
    payment_method: &str,
    now: DateTime<Utc>,
) -> Result<SubscriptionState, SubscriptionStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let existing = tx
        .query_opt(
            "SELECT tier, credits, start_date, end_date
             FROM prep.subscriptions
             WHERE user_id = $1
             FOR UPDATE",
            &[&user_id],
        )
        .await?
        .map(|row| {
            let tier_raw: String = row.get("tier");
            let tier = Tier::parse(&tier_raw).ok_or_else(|| {
                SubscriptionStorageError::Mapping(format!("unknown tier: {tier_raw}"))
            })?;

            Ok::<_, SubscriptionStorageError>(SubscriptionState {
                tier,
                credits: row.get("credits"),
                start_date: row.get("start_date"),
                end_date: row.get("end_date"),
            })
        })
        .transpose()?;

    let next = reconcile(existing.as_ref(), tier, now);

    tx.execute(
        "INSERT INTO prep.subscriptions (user_id, tier, credits, start_date, end_date, payment_method, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (user_id) DO UPDATE SET
            tier = EXCLUDED.tier,
            credits = EXCLUDED.credits,
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            payment_method = EXCLUDED.payment_method,
            updated_at = EXCLUDED.updated_at",
        &[
            &user_id,
            &next.tier.as_str(),
            &next.credits,
            &next.start_date,
            &next.end_date,
            &payment_method,
            &now,
        ],
    )
    .await?;

    let updated = tx
        .execute(
            "UPDATE prep.users SET credits = $2 WHERE id = $1",
            &[&user_id, &next.credits],
        )
        .await?;

    if updated == 0 {
        return Err(SubscriptionStorageError::UserNotFound(user_id));
    }

    tx.commit().await?;

    Ok(next)
}
