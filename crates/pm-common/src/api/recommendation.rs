use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationKind {
    StrongMatch,
    Practice,
}

impl RecommendationKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STRONG_MATCH" => Some(RecommendationKind::StrongMatch),
            "PRACTICE" => Some(RecommendationKind::Practice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationDto {
    pub id: i64,
    pub kind: RecommendationKind,
    pub message: String,
    pub priority: i32,
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub success: bool,
    pub recommendations: Vec<RecommendationDto>,
}

/// Row produced by the scheduled refresh before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationDraft {
    pub user_id: i64,
    pub kind: RecommendationKind,
    pub message: String,
    pub priority: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_storage_form() {
        for kind in [RecommendationKind::StrongMatch, RecommendationKind::Practice] {
            assert_eq!(RecommendationKind::parse(kind.as_ref()), Some(kind));
        }
        assert_eq!(RecommendationKind::parse("OTHER"), None);
    }
}
