use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use dotenvy::dotenv;
use metrics::counter;
use pm_common::db::{
    create_pool_from_url_checked, fetch_active_postings, fetch_candidate_pool, run_migrations,
    upsert_candidate_matching, CandidateMatchingInsert, MatchingStorageError, PgPool,
};
use pm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use pm_common::matching::{MatchScore, MatchingConfig, ScoreEngine, WeightedScoreEngine};
use pm_common::{CandidateProfile, JobPosting};
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "pm-matcher",
    about = "Batch writer refreshing the candidate matching cache"
)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Cron expression for the daily refresh
    #[arg(long, env = "PM_MATCHER_CRON", default_value = "0 0 * * *")]
    cron: String,

    /// Run a single refresh immediately and exit instead of scheduling
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationSummary {
    run_id: Uuid,
    success: bool,
    postings_processed: usize,
    rows_written: u64,
    failures: Vec<String>,
    timestamp: DateTime<Utc>,
}

fn build_insert(
    posting: &JobPosting,
    candidate: &CandidateProfile,
    score: &MatchScore,
) -> CandidateMatchingInsert {
    CandidateMatchingInsert {
        job_posting_id: posting.id.unwrap_or_default(),
        candidate_id: candidate.id.unwrap_or_default(),
        match_score: score.total,
        skills_match: score.skills.score,
        domain_match: score.domains.score,
        experience_match: score.experience.score,
        ai_reason: score.reason(),
        computed_at: None,
    }
}

async fn refresh_posting(
    pool: &PgPool,
    engine: &dyn ScoreEngine,
    posting: &JobPosting,
    candidates: &[CandidateProfile],
) -> Result<u64, MatchingStorageError> {
    let mut written = 0u64;
    for candidate in candidates {
        let score = engine.score(posting, candidate);
        written +=
            upsert_candidate_matching(pool, &build_insert(posting, candidate, &score)).await?;
    }

    Ok(written)
}

/// One full cache refresh. A failure on one posting is recorded and the rest
/// still process; the whole run then reports failed so the next scheduled
/// trigger acts as the retry.
async fn run_generation(pool: &PgPool, engine: &dyn ScoreEngine) -> GenerationSummary {
    let run_id = Uuid::new_v4();
    let mut rows_written = 0u64;
    let mut postings_processed = 0usize;
    let mut failures = Vec::new();

    let postings = match fetch_active_postings(pool).await {
        Ok(postings) => postings,
        Err(err) => {
            return GenerationSummary {
                run_id,
                success: false,
                postings_processed: 0,
                rows_written: 0,
                failures: vec![format!("failed to list active postings: {err}")],
                timestamp: Utc::now(),
            }
        }
    };

    let candidates = match fetch_candidate_pool(pool).await {
        Ok(candidates) => candidates,
        Err(err) => {
            return GenerationSummary {
                run_id,
                success: false,
                postings_processed: 0,
                rows_written: 0,
                failures: vec![format!("failed to load candidate pool: {err}")],
                timestamp: Utc::now(),
            }
        }
    };

    for posting in &postings {
        match refresh_posting(pool, engine, posting, &candidates).await {
            Ok(written) => {
                rows_written += written;
                postings_processed += 1;
                counter!("pm_matcher_rows_written").increment(written);
            }
            Err(err) => {
                let posting_id = posting.id.unwrap_or_default();
                warn!(posting_id, error = %err, "posting refresh failed; continuing");
                failures.push(format!("posting {posting_id}: {err}"));
                counter!("pm_matcher_posting_failures").increment(1);
            }
        }
    }

    GenerationSummary {
        run_id,
        success: failures.is_empty(),
        postings_processed,
        rows_written,
        failures,
        timestamp: Utc::now(),
    }
}

fn log_summary(summary: &GenerationSummary) {
    if summary.success {
        info!(
            run_id = %summary.run_id,
            postings = summary.postings_processed,
            rows = summary.rows_written,
            timestamp = %summary.timestamp,
            "matching generation finished"
        );
    } else {
        error!(
            run_id = %summary.run_id,
            postings = summary.postings_processed,
            rows = summary.rows_written,
            failures = summary.failures.len(),
            timestamp = %summary.timestamp,
            "matching generation finished with failures"
        );
        for failure in &summary.failures {
            error!(%failure, "matching generation failure detail");
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing_subscriber("pm-matcher");
    install_tracing_panic_hook("pm-matcher");
    pm_metrics::init_metrics("PM_MATCHER_METRICS_PORT", 9187);

    let cli = Cli::parse();
    let pool = create_pool_from_url_checked(&cli.database_url).await?;
    run_migrations(&pool).await?;

    let engine = Arc::new(WeightedScoreEngine::new(MatchingConfig::from_env()));

    if cli.once {
        let summary = run_generation(&pool, engine.as_ref()).await;
        log_summary(&summary);
        if !summary.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    let sched = JobScheduler::new().await?;
    let cron = cli.cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = pool.clone();
        let engine = engine.clone();
        Box::pin(async move {
            let summary = run_generation(&pool, engine.as_ref()).await;
            log_summary(&summary);
        })
    })?;

    sched.add(job).await?;
    sched.start().await?;

    info!(cron = %cli.cron, "pm-matcher scheduled");
    let _ = tokio::signal::ctrl_c().await;
    info!("pm-matcher shutting down");

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "pm-matcher failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> JobPosting {
        JobPosting {
            id: Some(7),
            enterprise_id: 1,
            title: "Data Engineer".into(),
            is_active: true,
            domains: vec!["data".into()],
            required_skills: vec!["python".into(), "sql".into()],
            min_experience_years: Some(2),
            created_at: None,
        }
    }

    fn candidate() -> CandidateProfile {
        CandidateProfile {
            id: Some(21),
            name: "Sam".into(),
            email: "sam@example.com".into(),
            skills: vec!["python".into()],
            domains: vec!["data".into()],
            experience_years: Some(4),
        }
    }

    #[test]
    fn insert_carries_the_score_breakdown() {
        let engine = WeightedScoreEngine::new(MatchingConfig::default());
        let posting = posting();
        let candidate = candidate();
        let score = engine.score(&posting, &candidate);

        let insert = build_insert(&posting, &candidate, &score);

        assert_eq!(insert.job_posting_id, 7);
        assert_eq!(insert.candidate_id, 21);
        assert!((insert.skills_match - 0.5).abs() < 1e-9);
        assert!((insert.domain_match - 1.0).abs() < 1e-9);
        assert!((insert.experience_match - 1.0).abs() < 1e-9);
        assert!(insert.ai_reason.contains("1/2 required skills matched"));
        assert!(insert.match_score <= 1.0);
    }

    #[test]
    fn default_cron_is_midnight_daily() {
        let cli = Cli::parse_from(["pm-matcher", "--database-url", "postgres://x@localhost/db"]);
        assert_eq!(cli.cron, "0 0 * * *");
        assert!(!cli.once);
    }
}
