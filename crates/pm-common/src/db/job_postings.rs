use tokio_postgres::Row;
use tracing::instrument;

use crate::db::util::TimedClientExt;
use crate::db::{db_error, PgPool};
use crate::JobPosting;

db_error!(JobPostingFetchError {});

fn map_posting(row: &Row) -> JobPosting {
    JobPosting {
        id: Some(row.get("id")),
        enterprise_id: row.get("enterprise_id"),
        title: row.get("title"),
        is_active: row.get("is_active"),
        domains: row.get("domains"),
        required_skills: row.get("required_skills"),
        min_experience_years: row.get("min_experience_years"),
        created_at: row.get("created_at"),
    }
}

#[instrument(skip(pool))]
pub async fn fetch_job_posting(
    pool: &PgPool,
    id: i64,
) -> Result<Option<JobPosting>, JobPostingFetchError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_opt_cached(
            "SELECT id, enterprise_id, title, is_active, domains, required_skills,
                    min_experience_years, created_at
             FROM prep.job_postings
             WHERE id = $1",
            &[&id],
            "job_postings.fetch",
        )
        .await?;

    Ok(row.as_ref().map(map_posting))
}

/// Postings the batch writer refreshes: active ones only.
#[instrument(skip(pool))]
pub async fn fetch_active_postings(pool: &PgPool) -> Result<Vec<JobPosting>, JobPostingFetchError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT id, enterprise_id, title, is_active, domains, required_skills,
                    min_experience_years, created_at
             FROM prep.job_postings
             WHERE is_active
             ORDER BY id",
            &[],
            "job_postings.fetch_active",
        )
        .await?;

    Ok(rows.iter().map(map_posting).collect())
}
