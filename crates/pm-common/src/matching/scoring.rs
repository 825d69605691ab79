use super::weights::{Weights, DEFAULT_WEIGHTS};
use crate::{CandidateProfile, JobPosting};

/// The scoring formula behind the cached rows is a replaceable policy; batch
/// writer and regenerate endpoint only depend on this seam.
pub trait ScoreEngine: Send + Sync {
    fn score(&self, posting: &JobPosting, candidate: &CandidateProfile) -> MatchScore;
}

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub weights: Weights,
    /// Extra years granted before a candidate is considered under-experienced.
    pub experience_buffer_years: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            experience_buffer_years: 0.5,
        }
    }
}

impl MatchingConfig {
    pub fn from_env() -> Self {
        fn env_f64(name: &str) -> Option<f64> {
            std::env::var(name).ok().and_then(|s| s.parse().ok())
        }

        let defaults = Self::default();
        let weights = Weights {
            skills: env_f64("PM_WEIGHT_SKILLS").unwrap_or(defaults.weights.skills),
            domains: env_f64("PM_WEIGHT_DOMAINS").unwrap_or(defaults.weights.domains),
            experience: env_f64("PM_WEIGHT_EXPERIENCE").unwrap_or(defaults.weights.experience),
        }
        .normalized();

        Self {
            weights,
            experience_buffer_years: env_f64("PM_EXPERIENCE_BUFFER_YEARS")
                .unwrap_or(defaults.experience_buffer_years),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringResult {
    pub score: f64,
    pub status: &'static str,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct MatchScore {
    pub total: f64,
    pub skills: ScoringResult,
    pub domains: ScoringResult,
    pub experience: ScoringResult,
}

impl MatchScore {
    /// Human-readable explanation persisted alongside the numeric scores.
    pub fn reason(&self) -> String {
        format!(
            "{}; {}; {}",
            self.skills.details, self.domains.details, self.experience.details
        )
    }
}

pub struct WeightedScoreEngine {
    config: MatchingConfig,
}

impl WeightedScoreEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    fn score_skills(&self, posting: &JobPosting, candidate: &CandidateProfile) -> ScoringResult {
        overlap_score(
            &posting.required_skills,
            &candidate.skills,
            "required skills",
        )
    }

    fn score_domains(&self, posting: &JobPosting, candidate: &CandidateProfile) -> ScoringResult {
        overlap_score(&posting.domains, &candidate.domains, "domains")
    }

    fn score_experience(&self, posting: &JobPosting, candidate: &CandidateProfile) -> ScoringResult {
        let required = match posting.min_experience_years {
            Some(years) if years > 0 => years as f64,
            _ => {
                return ScoringResult {
                    score: 1.0,
                    status: "MATCH",
                    details: "no minimum experience required".into(),
                }
            }
        };

        let actual = match candidate.experience_years {
            Some(years) => years as f64,
            None => {
                return ScoringResult {
                    score: 0.5,
                    status: "UNKNOWN",
                    details: "candidate experience unknown, neutral score".into(),
                }
            }
        };

        if actual + self.config.experience_buffer_years >= required {
            ScoringResult {
                score: 1.0,
                status: "MATCH",
                details: format!("{actual:.0}y meets the {required:.0}y requirement"),
            }
        } else {
            ScoringResult {
                score: (actual / required).clamp(0.0, 1.0),
                status: "PARTIAL",
                details: format!("{actual:.0}y below the {required:.0}y requirement"),
            }
        }
    }
}

impl ScoreEngine for WeightedScoreEngine {
    fn score(&self, posting: &JobPosting, candidate: &CandidateProfile) -> MatchScore {
        let skills = self.score_skills(posting, candidate);
        let domains = self.score_domains(posting, candidate);
        let experience = self.score_experience(posting, candidate);

        let weights = self.config.weights;
        let total = skills.score * weights.skills
            + domains.score * weights.domains
            + experience.score * weights.experience;

        MatchScore {
            total: total.clamp(0.0, 1.0),
            skills,
            domains,
            experience,
        }
    }
}

fn normalize_keyword(value: &str) -> String {
    value.trim().to_lowercase()
}

fn overlap_score(wanted: &[String], possessed: &[String], label: &str) -> ScoringResult {
    if wanted.is_empty() {
        return ScoringResult {
            score: 0.5,
            status: "UNKNOWN",
            details: format!("no {label} listed, neutral score"),
        };
    }

    let possessed: Vec<String> = possessed.iter().map(|s| normalize_keyword(s)).collect();
    let matched = wanted
        .iter()
        .filter(|w| possessed.contains(&normalize_keyword(w)))
        .count();

    let score = matched as f64 / wanted.len() as f64;
    let status = if matched == wanted.len() {
        "MATCH"
    } else if matched > 0 {
        "PARTIAL"
    } else {
        "MISS"
    };

    ScoringResult {
        score,
        status,
        details: format!("{matched}/{} {label} matched", wanted.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(skills: &[&str], domains: &[&str], min_years: Option<i32>) -> JobPosting {
        JobPosting {
            id: Some(1),
            enterprise_id: 10,
            title: "Backend Engineer".into(),
            is_active: true,
            domains: domains.iter().map(|s| s.to_string()).collect(),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            min_experience_years: min_years,
            created_at: None,
        }
    }

    fn candidate(skills: &[&str], domains: &[&str], years: Option<i32>) -> CandidateProfile {
        CandidateProfile {
            id: Some(2),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            domains: domains.iter().map(|s| s.to_string()).collect(),
            experience_years: years,
        }
    }

    #[test]
    fn full_overlap_scores_one() {
        let engine = WeightedScoreEngine::new(MatchingConfig::default());
        let score = engine.score(
            &posting(&["rust", "sql"], &["backend"], Some(3)),
            &candidate(&["Rust", "SQL", "docker"], &["Backend"], Some(5)),
        );

        assert!((score.total - 1.0).abs() < 1e-9);
        assert_eq!(score.skills.status, "MATCH");
        assert_eq!(score.domains.status, "MATCH");
    }

    #[test]
    fn partial_skill_overlap_is_fractional() {
        let engine = WeightedScoreEngine::new(MatchingConfig::default());
        let score = engine.score(
            &posting(&["rust", "sql", "kafka", "redis"], &[], None),
            &candidate(&["rust"], &[], None),
        );

        assert!((score.skills.score - 0.25).abs() < 1e-9);
        assert_eq!(score.skills.status, "PARTIAL");
        // missing domain list and missing requirement stay neutral/positive
        assert_eq!(score.domains.status, "UNKNOWN");
        assert_eq!(score.experience.status, "MATCH");
    }

    #[test]
    fn under_experience_scales_with_ratio() {
        let engine = WeightedScoreEngine::new(MatchingConfig::default());
        let score = engine.score(
            &posting(&[], &[], Some(4)),
            &candidate(&[], &[], Some(2)),
        );

        assert_eq!(score.experience.status, "PARTIAL");
        assert!((score.experience.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn buffer_lets_near_miss_pass() {
        let engine = WeightedScoreEngine::new(MatchingConfig::default());
        let score = engine.score(
            &posting(&[], &[], Some(3)),
            // 2.5y + 0.5y buffer == requirement
            &candidate(&[], &[], Some(3)),
        );

        assert_eq!(score.experience.status, "MATCH");
    }

    #[test]
    fn reason_concatenates_factor_details() {
        let engine = WeightedScoreEngine::new(MatchingConfig::default());
        let score = engine.score(
            &posting(&["rust"], &["backend"], Some(1)),
            &candidate(&["rust"], &["backend"], Some(2)),
        );

        let reason = score.reason();
        assert!(reason.contains("1/1 required skills matched"));
        assert!(reason.contains("1/1 domains matched"));
    }

    #[test]
    fn total_stays_in_storage_range() {
        let engine = WeightedScoreEngine::new(MatchingConfig::default());
        let score = engine.score(
            &posting(&["rust"], &["backend"], Some(10)),
            &candidate(&[], &[], None),
        );

        assert!(score.total >= 0.0 && score.total <= 1.0);
    }
}
