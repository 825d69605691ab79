use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on rows returned by the cache reader, regardless of how many
/// cached pairs exist for the posting.
pub const MAX_CACHED_MATCHES: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub domains: Vec<String>,
    pub experience_years: Option<i32>,
}

/// The single most-recently-updated portfolio of the candidate, when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedMatch {
    pub job_posting_id: i64,
    pub match_score: f64,
    pub skills_match: f64,
    pub domain_match: f64,
    pub experience_match: f64,
    pub ai_reason: String,
    pub computed_at: DateTime<Utc>,
    pub candidate: CandidateSummary,
    pub portfolio: Option<PortfolioSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingCacheResponse {
    pub success: bool,
    pub matches: Vec<CachedMatch>,
    pub total: usize,
    /// Always true on this endpoint: rows come from the batch-written cache,
    /// never from a fresh computation.
    pub from_cache: bool,
    pub cached_at: DateTime<Utc>,
}

impl MatchingCacheResponse {
    /// Shape fetched rows for the client: score-descending, capped at
    /// [`MAX_CACHED_MATCHES`].
    pub fn from_rows(mut matches: Vec<CachedMatch>, cached_at: DateTime<Utc>) -> Self {
        matches.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        matches.truncate(MAX_CACHED_MATCHES);

        Self {
            success: true,
            total: matches.len(),
            matches,
            from_cache: true,
            cached_at,
        }
    }
}

/// Result of the synchronous regenerate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub rows_written: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(score: f64) -> CachedMatch {
        CachedMatch {
            job_posting_id: 1,
            match_score: score,
            skills_match: score,
            domain_match: score,
            experience_match: score,
            ai_reason: String::new(),
            computed_at: Utc::now(),
            candidate: CandidateSummary {
                id: 1,
                name: "c".into(),
                email: "c@example.com".into(),
                skills: vec![],
                domains: vec![],
                experience_years: None,
            },
            portfolio: None,
        }
    }

    #[test]
    fn rows_are_sorted_descending_and_capped_at_50() {
        let rows: Vec<CachedMatch> = (0..60).map(|i| row(i as f64 / 100.0)).collect();
        let response = MatchingCacheResponse::from_rows(rows, Utc::now());

        assert_eq!(response.matches.len(), MAX_CACHED_MATCHES);
        assert_eq!(response.total, MAX_CACHED_MATCHES);
        assert!(response.from_cache);
        assert!(response
            .matches
            .windows(2)
            .all(|pair| pair[0].match_score >= pair[1].match_score));
        // the cap keeps the best rows, not the first ones
        assert!((response.matches[0].match_score - 0.59).abs() < 1e-9);
    }

    #[test]
    fn wire_shape_uses_camel_case_keys() {
        let response = MatchingCacheResponse::from_rows(vec![row(0.9)], Utc::now());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["fromCache"], true);
        assert!(json.get("cachedAt").is_some());
        assert!(json["matches"][0].get("matchScore").is_some());
        assert!(json["matches"][0].get("aiReason").is_some());
    }
}
