pub mod scoring;
pub mod weights;

pub use scoring::{MatchScore, MatchingConfig, ScoreEngine, ScoringResult, WeightedScoreEngine};
pub use weights::Weights;
