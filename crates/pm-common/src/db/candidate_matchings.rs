use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::api::matching_cache::{CachedMatch, CandidateSummary, PortfolioSummary};
use crate::db::util::TimedClientExt;
use crate::db::{db_error, PgPool};

db_error!(MatchingStorageError {});

/// Candidate-side view of a cached pair, used by the recommendation refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct StrongMatch {
    pub job_posting_id: i64,
    pub job_title: String,
    pub match_score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CandidateMatchingInsert {
    pub job_posting_id: i64,
    pub candidate_id: i64,
    pub match_score: f64,
    pub skills_match: f64,
    pub domain_match: f64,
    pub experience_match: f64,
    pub ai_reason: String,
    pub computed_at: Option<DateTime<Utc>>,
}

/// Upsert one cached pair. The `(job_posting_id, candidate_id)` unique key
/// keeps at most one live row per pair; recomputation overwrites in place,
/// so concurrent regenerations resolve last-writer-wins.
#[instrument(skip(pool, insert))]
pub async fn upsert_candidate_matching(
    pool: &PgPool,
    insert: &CandidateMatchingInsert,
) -> Result<u64, MatchingStorageError> {
    let client = pool.get().await?;
    let computed_at = insert.computed_at.unwrap_or_else(Utc::now);

    let rows = client
        .timed_execute_cached(
            "INSERT INTO prep.candidate_matchings (
                job_posting_id,
                candidate_id,
                match_score,
                skills_match,
                domain_match,
                experience_match,
                ai_reason,
                computed_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8
            )
            ON CONFLICT (job_posting_id, candidate_id) DO UPDATE SET
                match_score = EXCLUDED.match_score,
                skills_match = EXCLUDED.skills_match,
                domain_match = EXCLUDED.domain_match,
                experience_match = EXCLUDED.experience_match,
                ai_reason = EXCLUDED.ai_reason,
                computed_at = EXCLUDED.computed_at",
            &[
                &insert.job_posting_id,
                &insert.candidate_id,
                &insert.match_score,
                &insert.skills_match,
                &insert.domain_match,
                &insert.experience_match,
                &insert.ai_reason,
                &computed_at,
            ],
            "candidate_matchings.upsert",
        )
        .await?;

    Ok(rows)
}

/// Cached pairs for one candidate scoring at or above `threshold`, best
/// first, restricted to postings that are still active.
#[instrument(skip(pool))]
pub async fn fetch_strong_matches_for_candidate(
    pool: &PgPool,
    candidate_id: i64,
    threshold: f64,
    limit: i64,
) -> Result<Vec<StrongMatch>, MatchingStorageError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT cm.job_posting_id, jp.title, cm.match_score
             FROM prep.candidate_matchings cm
             JOIN prep.job_postings jp ON jp.id = cm.job_posting_id
             WHERE cm.candidate_id = $1
               AND cm.match_score >= $2
               AND jp.is_active
             ORDER BY cm.match_score DESC
             LIMIT $3",
            &[&candidate_id, &threshold, &limit],
            "candidate_matchings.strong_for_candidate",
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| StrongMatch {
            job_posting_id: row.get("job_posting_id"),
            job_title: row.get("title"),
            match_score: row.get("match_score"),
        })
        .collect())
}

/// Cached rows for one posting, best first, each with the candidate summary
/// and the candidate's most-recently-updated portfolio when one exists.
#[instrument(skip(pool))]
pub async fn fetch_cached_matches(
    pool: &PgPool,
    job_posting_id: i64,
    limit: i64,
) -> Result<Vec<CachedMatch>, MatchingStorageError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT
                cm.job_posting_id,
                cm.candidate_id,
                cm.match_score,
                cm.skills_match,
                cm.domain_match,
                cm.experience_match,
                cm.ai_reason,
                cm.computed_at,
                u.name,
                u.email,
                u.skills,
                u.domains,
                u.experience_years,
                p.id AS portfolio_id,
                p.title AS portfolio_title,
                p.summary AS portfolio_summary,
                p.updated_at AS portfolio_updated_at
            FROM prep.candidate_matchings cm
            JOIN prep.users u ON u.id = cm.candidate_id
            LEFT JOIN LATERAL (
                SELECT id, title, summary, updated_at
                FROM prep.portfolios
                WHERE user_id = cm.candidate_id
                ORDER BY updated_at DESC
                LIMIT 1
            ) p ON true
            WHERE cm.job_posting_id = $1
            ORDER BY cm.match_score DESC
            LIMIT $2",
            &[&job_posting_id, &limit],
            "candidate_matchings.fetch_cached",
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let portfolio = row
                .get::<_, Option<i64>>("portfolio_id")
                .map(|id| PortfolioSummary {
                    id,
                    title: row.get("portfolio_title"),
                    summary: row.get("portfolio_summary"),
                    updated_at: row.get("portfolio_updated_at"),
                });

            CachedMatch {
                job_posting_id: row.get("job_posting_id"),
                match_score: row.get("match_score"),
                skills_match: row.get("skills_match"),
                domain_match: row.get("domain_match"),
                experience_match: row.get("experience_match"),
                ai_reason: row.get("ai_reason"),
                computed_at: row.get("computed_at"),
                candidate: CandidateSummary {
                    id: row.get("candidate_id"),
                    name: row.get("name"),
                    email: row.get("email"),
                    skills: row.get("skills"),
                    domains: row.get("domains"),
                    experience_years: row.get("experience_years"),
                },
                portfolio,
            }
        })
        .collect())
}
