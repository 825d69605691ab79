use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::db::quizzes::count_incomplete_quizzes;
use crate::db::{db_error, PgPool};

db_error!(InterviewStorageError {
    #[error("application not found: {0}")]
    ApplicationNotFound(i64),
    #[error("{remaining} technical test(s) still pending for this application")]
    QuizzesIncomplete { remaining: i64 },
});

/// Insert an interview meeting for one of the candidate's applications.
/// Gate: every quiz attached to the application's posting must already have
/// a passing result from the candidate. The caller parses `scheduled_at`
/// before this function runs, so a malformed date never reaches the db.
#[instrument(skip(pool))]
pub async fn schedule_interview_meeting(
    pool: &PgPool,
    candidate_id: i64,
    application_id: i64,
    scheduled_at: DateTime<Utc>,
    meeting_url: Option<&str>,
) -> Result<i64, InterviewStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let application = tx
        .query_opt(
            "SELECT id, job_posting_id
             FROM prep.applications
             WHERE id = $1 AND candidate_id = $2",
            &[&application_id, &candidate_id],
        )
        .await?
        .ok_or(InterviewStorageError::ApplicationNotFound(application_id))?;

    let job_posting_id: i64 = application.get("job_posting_id");

    let remaining = count_incomplete_quizzes(&tx, job_posting_id, candidate_id).await?;
    if remaining > 0 {
        return Err(InterviewStorageError::QuizzesIncomplete { remaining });
    }

    let row = tx
        .query_one(
            "INSERT INTO prep.interview_meetings (application_id, scheduled_at, meeting_url)
             VALUES ($1, $2, $3)
             RETURNING id",
            &[&application_id, &scheduled_at, &meeting_url],
        )
        .await?;

    tx.commit().await?;

    Ok(row.get("id"))
}
