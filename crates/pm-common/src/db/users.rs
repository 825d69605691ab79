use std::collections::HashMap;

use tokio_postgres::Row;
use tracing::instrument;

use crate::db::util::TimedClientExt;
use crate::db::{db_error, PgPool};
use crate::{CandidateProfile, User, UserRole};

db_error!(UserStoreError {
    #[error("failed to map user row: {0}")]
    Mapping(String),
});

fn map_user(row: &Row) -> Result<User, UserStoreError> {
    let role_raw: String = row.get("role");
    let role = UserRole::parse(&role_raw)
        .ok_or_else(|| UserStoreError::Mapping(format!("unknown role: {role_raw}")))?;

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role,
        skills: row.get("skills"),
        domains: row.get("domains"),
        experience_years: row.get("experience_years"),
        credits: row.get("credits"),
        created_at: row.get("created_at"),
    })
}

#[instrument(skip(pool))]
pub async fn fetch_user_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, UserStoreError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_opt_cached(
            "SELECT id, name, email, role, skills, domains, experience_years, credits, created_at
             FROM prep.users
             WHERE id = $1",
            &[&id],
            "users.fetch_by_id",
        )
        .await?;

    row.as_ref().map(map_user).transpose()
}

/// All candidate users, shaped for the score engine.
#[instrument(skip(pool))]
pub async fn fetch_candidate_pool(pool: &PgPool) -> Result<Vec<CandidateProfile>, UserStoreError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT id, name, email, skills, domains, experience_years
             FROM prep.users
             WHERE role = 'CANDIDATE'
             ORDER BY id",
            &[],
            "users.fetch_candidate_pool",
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| CandidateProfile {
            id: Some(row.get("id")),
            name: row.get("name"),
            email: row.get("email"),
            skills: row.get("skills"),
            domains: row.get("domains"),
            experience_years: row.get("experience_years"),
        })
        .collect())
}

#[instrument(skip(pool, ids))]
pub async fn fetch_user_names(
    pool: &PgPool,
    ids: &[i64],
) -> Result<HashMap<i64, String>, UserStoreError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let client = pool.get().await?;
    let ids = ids.to_vec();

    let rows = client
        .timed_query_cached(
            "SELECT id, name FROM prep.users WHERE id = ANY($1)",
            &[&ids],
            "users.fetch_names",
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("id"), row.get("name")))
        .collect())
}
