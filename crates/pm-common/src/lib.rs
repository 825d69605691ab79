pub mod api;
pub mod db;
pub mod logging;
pub mod matching;
pub mod reputation;
pub mod subscription;

use chrono::{DateTime, Utc};

// Commonly used data models for the matching functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPosting {
    pub id: Option<i64>,
    pub enterprise_id: i64,
    pub title: String,
    pub is_active: bool,
    pub domains: Vec<String>,
    pub required_skills: Vec<String>,
    pub min_experience_years: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateProfile {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub domains: Vec<String>,
    pub experience_years: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Candidate,
    Enterprise,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Candidate => "CANDIDATE",
            UserRole::Enterprise => "ENTERPRISE",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CANDIDATE" => Some(UserRole::Candidate),
            "ENTERPRISE" => Some(UserRole::Enterprise),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub skills: Vec<String>,
    pub domains: Vec<String>,
    pub experience_years: Option<i32>,
    pub credits: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn candidate_profile(&self) -> CandidateProfile {
        CandidateProfile {
            id: Some(self.id),
            name: self.name.clone(),
            email: self.email.clone(),
            skills: self.skills.clone(),
            domains: self.domains.clone(),
            experience_years: self.experience_years,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_storage_form() {
        for role in [UserRole::Candidate, UserRole::Enterprise, UserRole::Admin] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("MANAGER"), None);
    }
}
