use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::{DbPoolError, PgPool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    id: 1,
    description: "base tables for matching, quizzes, subscriptions and recommendations",
    sql: r#"
CREATE TABLE IF NOT EXISTS prep.users (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role VARCHAR(20) NOT NULL DEFAULT 'CANDIDATE',
    skills TEXT[] NOT NULL DEFAULT '{}',
    domains TEXT[] NOT NULL DEFAULT '{}',
    experience_years INTEGER,
    credits BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_role CHECK (role IN ('CANDIDATE', 'ENTERPRISE', 'ADMIN'))
);

CREATE TABLE IF NOT EXISTS prep.job_postings (
    id BIGSERIAL PRIMARY KEY,
    enterprise_id BIGINT NOT NULL REFERENCES prep.users(id),
    title TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    domains TEXT[] NOT NULL DEFAULT '{}',
    required_skills TEXT[] NOT NULL DEFAULT '{}',
    min_experience_years INTEGER,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_job_postings_active
    ON prep.job_postings(is_active, id);

CREATE TABLE IF NOT EXISTS prep.candidate_matchings (
    id BIGSERIAL PRIMARY KEY,
    job_posting_id BIGINT NOT NULL REFERENCES prep.job_postings(id),
    candidate_id BIGINT NOT NULL REFERENCES prep.users(id),
    match_score DOUBLE PRECISION NOT NULL,
    skills_match DOUBLE PRECISION NOT NULL,
    domain_match DOUBLE PRECISION NOT NULL,
    experience_match DOUBLE PRECISION NOT NULL,
    ai_reason TEXT NOT NULL DEFAULT '',
    computed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_candidate_matchings_pair UNIQUE (job_posting_id, candidate_id),
    CONSTRAINT chk_match_score_range
        CHECK (match_score >= 0.0 AND match_score <= 1.0)
);

CREATE INDEX IF NOT EXISTS idx_candidate_matchings_ranking
    ON prep.candidate_matchings(job_posting_id, match_score DESC);

CREATE TABLE IF NOT EXISTS prep.recommendations (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES prep.users(id),
    kind VARCHAR(20) NOT NULL,
    message TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 1,
    viewed BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_recommendation_kind CHECK (kind IN ('STRONG_MATCH', 'PRACTICE'))
);

CREATE INDEX IF NOT EXISTS idx_recommendations_user
    ON prep.recommendations(user_id, viewed, priority DESC);

CREATE TABLE IF NOT EXISTS prep.applications (
    id BIGSERIAL PRIMARY KEY,
    candidate_id BIGINT NOT NULL REFERENCES prep.users(id),
    job_posting_id BIGINT NOT NULL REFERENCES prep.job_postings(id),
    status VARCHAR(20) NOT NULL DEFAULT 'SUBMITTED',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_applications_pair UNIQUE (candidate_id, job_posting_id)
);

CREATE TABLE IF NOT EXISTS prep.job_quizzes (
    id BIGSERIAL PRIMARY KEY,
    job_posting_id BIGINT REFERENCES prep.job_postings(id),
    title TEXT NOT NULL,
    domain TEXT,
    difficulty VARCHAR(20),
    duration_minutes INTEGER,
    passing_score INTEGER NOT NULL DEFAULT 60,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS prep.quiz_results (
    id BIGSERIAL PRIMARY KEY,
    quiz_id BIGINT NOT NULL REFERENCES prep.job_quizzes(id),
    user_id BIGINT NOT NULL REFERENCES prep.users(id),
    score INTEGER NOT NULL,
    passed BOOLEAN NOT NULL DEFAULT false,
    completed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_quiz_results_user
    ON prep.quiz_results(user_id, completed_at);

CREATE TABLE IF NOT EXISTS prep.subscriptions (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL UNIQUE REFERENCES prep.users(id),
    tier VARCHAR(20) NOT NULL,
    credits BIGINT NOT NULL DEFAULT 0,
    start_date TIMESTAMPTZ NOT NULL,
    end_date TIMESTAMPTZ NOT NULL,
    payment_method TEXT,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_tier CHECK (tier IN ('FREE', 'PREMIUM', 'EXPERT'))
);

CREATE TABLE IF NOT EXISTS prep.favorites (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES prep.users(id),
    target_id BIGINT NOT NULL,
    target_type VARCHAR(20) NOT NULL,
    is_favorite BOOLEAN NOT NULL DEFAULT true,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_favorites_target UNIQUE (user_id, target_id, target_type),
    CONSTRAINT chk_favorite_target CHECK (target_type IN ('QUIZ', 'JOB_POSTING'))
);

CREATE TABLE IF NOT EXISTS prep.interview_meetings (
    id BIGSERIAL PRIMARY KEY,
    application_id BIGINT NOT NULL REFERENCES prep.applications(id),
    scheduled_at TIMESTAMPTZ NOT NULL,
    meeting_url TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS prep.search_templates (
    id BIGSERIAL PRIMARY KEY,
    enterprise_id BIGINT NOT NULL REFERENCES prep.users(id),
    name TEXT NOT NULL,
    filters JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS prep.portfolios (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES prep.users(id),
    title TEXT NOT NULL,
    summary TEXT,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_portfolios_user_updated
    ON prep.portfolios(user_id, updated_at DESC);
"#,
}];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS prep;
             CREATE TABLE IF NOT EXISTS prep.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM prep.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO prep.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
