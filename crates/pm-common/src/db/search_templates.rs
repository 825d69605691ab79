use tokio_postgres::types::Json;
use tracing::instrument;

use crate::db::util::TimedClientExt;
use crate::db::{db_error, PgPool};

db_error!(SearchTemplateStorageError {});

#[instrument(skip(pool, filters))]
pub async fn create_search_template(
    pool: &PgPool,
    enterprise_id: i64,
    name: &str,
    filters: &serde_json::Value,
) -> Result<i64, SearchTemplateStorageError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_one_cached(
            "INSERT INTO prep.search_templates (enterprise_id, name, filters)
             VALUES ($1, $2, $3)
             RETURNING id",
            &[&enterprise_id, &name, &Json(filters)],
            "search_templates.create",
        )
        .await?;

    Ok(row.get("id"))
}
