use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// What a favorite toggle points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FavoriteTarget {
    Quiz,
    JobPosting,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteRequest {
    pub target_id: i64,
    pub target_type: FavoriteTarget,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteResponse {
    pub success: bool,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// FREE | PREMIUM | EXPERT; parsed server-side so an unknown tier is a
    /// validation failure, not a deserialization rejection.
    pub tier: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub tier: String,
    pub credits: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub success: bool,
    pub subscription: SubscriptionDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMeetingRequest {
    pub application_id: i64,
    /// RFC 3339; parsed before any write so a bad format never reaches the db.
    pub scheduled_at: String,
    pub meeting_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMeetingResponse {
    pub success: bool,
    pub meeting_id: i64,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSearchTemplateRequest {
    pub name: String,
    pub filters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSearchTemplateResponse {
    pub success: bool,
    pub template_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn favorite_target_serializes_screaming_snake() {
        assert_eq!(FavoriteTarget::Quiz.as_ref(), "QUIZ");
        assert_eq!(FavoriteTarget::JobPosting.as_ref(), "JOB_POSTING");

        let parsed: ToggleFavoriteRequest =
            serde_json::from_str(r#"{"targetId": 7, "targetType": "QUIZ"}"#).unwrap();
        assert_eq!(parsed.target_type, FavoriteTarget::Quiz);
    }
}
