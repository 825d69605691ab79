/// Store error enums share the pool/postgres variants; each module adds its
/// own domain variants on top.
macro_rules! db_error {
    ($name:ident { $($extra:tt)* }) => {
        #[derive(Debug, thiserror::Error)]
        pub enum $name {
            #[error("failed to get postgres connection: {0}")]
            Pool(#[from] deadpool_postgres::PoolError),
            #[error("postgres error: {0}")]
            Postgres(#[from] tokio_postgres::Error),
            $($extra)*
        }
    };
}

pub(crate) use db_error;

pub mod candidate_matchings;
pub mod favorites;
pub mod interviews;
pub mod job_postings;
pub mod migrations;
pub mod pool;
pub mod quizzes;
pub mod recommendations;
pub mod search_templates;
pub mod subscriptions;
pub mod users;
pub mod util;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use candidate_matchings::{
    fetch_cached_matches, fetch_strong_matches_for_candidate, upsert_candidate_matching,
    CandidateMatchingInsert, MatchingStorageError, StrongMatch,
};
pub use favorites::{toggle_favorite, FavoriteStorageError};
pub use interviews::{schedule_interview_meeting, InterviewStorageError};
pub use job_postings::{fetch_active_postings, fetch_job_posting, JobPostingFetchError};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPoolError, PgPool};
pub use quizzes::{
    fetch_quiz_aggregates, fetch_user_quiz_aggregate, list_quizzes, QuizStoreError,
};
pub use recommendations::{
    fetch_user_recommendations, mark_recommendation_viewed, replace_generated_recommendations,
    RecommendationStorageError,
};
pub use search_templates::{create_search_template, SearchTemplateStorageError};
pub use subscriptions::{subscribe_user, SubscriptionStorageError};
pub use users::{fetch_candidate_pool, fetch_user_by_id, fetch_user_names, UserStoreError};
