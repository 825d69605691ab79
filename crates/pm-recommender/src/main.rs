use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clap::Parser;
use dotenvy::dotenv;
use metrics::counter;
use pm_common::api::recommendation::{RecommendationDraft, RecommendationKind};
use pm_common::db::{
    create_pool_from_url_checked, fetch_candidate_pool, fetch_quiz_aggregates,
    fetch_strong_matches_for_candidate, replace_generated_recommendations, run_migrations, PgPool,
    StrongMatch,
};
use pm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Fewer completed quizzes than this earns a practice nudge.
const PRACTICE_NUDGE_THRESHOLD: i64 = 3;

const STRONG_MATCH_LIMIT: i64 = 5;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "pm-recommender",
    about = "Scheduled refresh of per-user recommendations"
)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Cron expression; runs after the matching refresh by default
    #[arg(long, env = "PM_RECOMMENDER_CRON", default_value = "30 0 * * *")]
    cron: String,

    /// Minimum cached score that earns an apply suggestion
    #[arg(long, env = "PM_RECOMMEND_THRESHOLD", default_value_t = 0.7)]
    threshold: f64,

    /// Run a single refresh immediately and exit instead of scheduling
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[derive(Debug, Clone, Serialize)]
struct RefreshSummary {
    run_id: Uuid,
    success: bool,
    users_processed: usize,
    recommendations_written: u64,
    failures: Vec<String>,
    timestamp: DateTime<Utc>,
}

fn priority_for_score(score: f64) -> i32 {
    if score >= 0.9 {
        3
    } else if score >= 0.8 {
        2
    } else {
        1
    }
}

/// Derive one user's recommendation batch from cached matches and quiz
/// history. Pure so the banding rules stay testable without a store.
fn build_drafts(user_id: i64, matches: &[StrongMatch], quizzes_taken: i64) -> Vec<RecommendationDraft> {
    let mut drafts: Vec<RecommendationDraft> = matches
        .iter()
        .map(|m| RecommendationDraft {
            user_id,
            kind: RecommendationKind::StrongMatch,
            message: format!(
                "You are a {:.0}% match for \"{}\" — consider applying",
                m.match_score * 100.0,
                m.job_title
            ),
            priority: priority_for_score(m.match_score),
        })
        .collect();

    if quizzes_taken < PRACTICE_NUDGE_THRESHOLD {
        drafts.push(RecommendationDraft {
            user_id,
            kind: RecommendationKind::Practice,
            message: "Complete more technical tests to strengthen your profile".into(),
            priority: 1,
        });
    }

    drafts
}

async fn refresh_user(
    pool: &PgPool,
    user_id: i64,
    threshold: f64,
    quizzes_taken: i64,
) -> Result<u64, Box<dyn std::error::Error>> {
    let matches =
        fetch_strong_matches_for_candidate(pool, user_id, threshold, STRONG_MATCH_LIMIT).await?;
    let drafts = build_drafts(user_id, &matches, quizzes_taken);
    Ok(replace_generated_recommendations(pool, user_id, &drafts).await?)
}

async fn run_refresh(pool: &PgPool, threshold: f64) -> RefreshSummary {
    let run_id = Uuid::new_v4();
    let mut users_processed = 0usize;
    let mut recommendations_written = 0u64;
    let mut failures = Vec::new();

    let candidates = match fetch_candidate_pool(pool).await {
        Ok(candidates) => candidates,
        Err(err) => {
            return RefreshSummary {
                run_id,
                success: false,
                users_processed: 0,
                recommendations_written: 0,
                failures: vec![format!("failed to load candidate pool: {err}")],
                timestamp: Utc::now(),
            }
        }
    };

    let quiz_counts: HashMap<i64, i64> = match fetch_quiz_aggregates(pool).await {
        Ok(aggregates) => aggregates
            .into_iter()
            .map(|a| (a.user_id, a.quizzes_taken))
            .collect(),
        Err(err) => {
            return RefreshSummary {
                run_id,
                success: false,
                users_processed: 0,
                recommendations_written: 0,
                failures: vec![format!("failed to load quiz aggregates: {err}")],
                timestamp: Utc::now(),
            }
        }
    };

    for candidate in &candidates {
        let Some(user_id) = candidate.id else { continue };
        let quizzes_taken = quiz_counts.get(&user_id).copied().unwrap_or(0);

        match refresh_user(pool, user_id, threshold, quizzes_taken).await {
            Ok(written) => {
                users_processed += 1;
                recommendations_written += written;
                counter!("pm_recommender_rows_written").increment(written);
            }
            Err(err) => {
                warn!(user_id, error = %err, "recommendation refresh failed; continuing");
                failures.push(format!("user {user_id}: {err}"));
                counter!("pm_recommender_user_failures").increment(1);
            }
        }
    }

    RefreshSummary {
        run_id,
        success: failures.is_empty(),
        users_processed,
        recommendations_written,
        failures,
        timestamp: Utc::now(),
    }
}

fn log_summary(summary: &RefreshSummary) {
    if summary.success {
        info!(
            run_id = %summary.run_id,
            users = summary.users_processed,
            rows = summary.recommendations_written,
            timestamp = %summary.timestamp,
            "recommendation refresh finished"
        );
    } else {
        error!(
            run_id = %summary.run_id,
            users = summary.users_processed,
            failures = summary.failures.len(),
            timestamp = %summary.timestamp,
            "recommendation refresh finished with failures"
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing_subscriber("pm-recommender");
    install_tracing_panic_hook("pm-recommender");
    pm_metrics::init_metrics("PM_RECOMMENDER_METRICS_PORT", 9188);

    let cli = Cli::parse();
    let pool = create_pool_from_url_checked(&cli.database_url).await?;
    run_migrations(&pool).await?;

    if cli.once {
        let summary = run_refresh(&pool, cli.threshold).await;
        log_summary(&summary);
        if !summary.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    let sched = JobScheduler::new().await?;
    let threshold = cli.threshold;

    let job = Job::new_async(cli.cron.as_str(), move |_uuid, _lock| {
        let pool = pool.clone();
        Box::pin(async move {
            let summary = run_refresh(&pool, threshold).await;
            log_summary(&summary);
        })
    })?;

    sched.add(job).await?;
    sched.start().await?;

    info!(cron = %cli.cron, "pm-recommender scheduled");
    let _ = tokio::signal::ctrl_c().await;
    info!("pm-recommender shutting down");

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "pm-recommender failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong(job_posting_id: i64, title: &str, score: f64) -> StrongMatch {
        StrongMatch {
            job_posting_id,
            job_title: title.into(),
            match_score: score,
        }
    }

    #[test]
    fn priority_bands_follow_score() {
        assert_eq!(priority_for_score(0.95), 3);
        assert_eq!(priority_for_score(0.85), 2);
        assert_eq!(priority_for_score(0.7), 1);
    }

    #[test]
    fn drafts_include_apply_suggestions_with_percent() {
        let drafts = build_drafts(9, &[strong(1, "Rust Backend", 0.92)], 5);

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, RecommendationKind::StrongMatch);
        assert_eq!(drafts[0].priority, 3);
        assert!(drafts[0].message.contains("92% match"));
        assert!(drafts[0].message.contains("Rust Backend"));
    }

    #[test]
    fn few_quizzes_earn_a_practice_nudge() {
        let drafts = build_drafts(9, &[], 1);

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, RecommendationKind::Practice);
    }

    #[test]
    fn active_quiz_takers_get_no_nudge() {
        let drafts = build_drafts(9, &[], PRACTICE_NUDGE_THRESHOLD);
        assert!(drafts.is_empty());
    }
}
