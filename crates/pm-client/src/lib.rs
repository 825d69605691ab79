//! Typed client for the matching cache endpoint. Mirrors the UI data hook:
//! reads are served from a local cache with a freshness window, revalidation
//! on focus/reconnect/interval is deliberately off (the server rows are
//! themselves a cache), and `regenerate` invalidates after a recompute.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use pm_common::api::matching_cache::{GenerateResponse, MatchingCacheResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Client-side retention policy for cached responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Entries younger than this are served without a network round-trip.
    pub stale_after: Duration,
    /// Entries older than this are dropped entirely.
    pub retain_for: Duration,
    pub refetch_on_focus: bool,
    pub refetch_on_reconnect: bool,
    pub refetch_interval: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(5 * 60),
            retain_for: Duration::from_secs(30 * 60),
            refetch_on_focus: false,
            refetch_on_reconnect: false,
            refetch_interval: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    Stale,
    Expired,
}

pub fn entry_state(age: Duration, policy: &CachePolicy) -> EntryState {
    if age < policy.stale_after {
        EntryState::Fresh
    } else if age < policy.retain_for {
        EntryState::Stale
    } else {
        EntryState::Expired
    }
}

struct CacheEntry {
    response: MatchingCacheResponse,
    fetched_at: Instant,
}

pub struct MatchingCacheClient {
    http: reqwest::Client,
    base_url: String,
    session_token: String,
    policy: CachePolicy,
    entries: Mutex<HashMap<i64, CacheEntry>>,
}

impl MatchingCacheClient {
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: session_token.into(),
            policy: CachePolicy::default(),
            entries: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cached read. Fresh entries short-circuit; stale-but-retained entries
    /// are refetched, falling back to the retained copy if the refetch
    /// fails; expired entries always hit the network.
    pub async fn cached_matches(
        &self,
        job_posting_id: i64,
    ) -> Result<MatchingCacheResponse, ClientError> {
        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&job_posting_id) {
                if entry_state(entry.fetched_at.elapsed(), &self.policy) == EntryState::Fresh {
                    debug!(job_posting_id, "serving fresh cache entry");
                    return Ok(entry.response.clone());
                }
            }
        }

        match self.fetch_remote(job_posting_id).await {
            Ok(response) => {
                let mut entries = self.entries.lock().await;
                entries.insert(
                    job_posting_id,
                    CacheEntry {
                        response: response.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(response)
            }
            Err(err) => {
                let entries = self.entries.lock().await;
                if let Some(entry) = entries.get(&job_posting_id) {
                    if entry_state(entry.fetched_at.elapsed(), &self.policy) != EntryState::Expired
                    {
                        debug!(job_posting_id, error = %err, "refetch failed, serving retained entry");
                        return Ok(entry.response.clone());
                    }
                }
                Err(err)
            }
        }
    }

    /// Post to the compute endpoint; on success the cached entry is
    /// invalidated so the next read picks up the fresh rows.
    pub async fn regenerate(&self, job_posting_id: i64) -> Result<GenerateResponse, ClientError> {
        let url = format!(
            "{}/api/matching/generate?jobPostingId={job_posting_id}",
            self.base_url
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.session_token)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let generated: GenerateResponse = response.json().await?;

        self.invalidate(job_posting_id).await;
        Ok(generated)
    }

    pub async fn invalidate(&self, job_posting_id: i64) {
        self.entries.lock().await.remove(&job_posting_id);
    }

    async fn fetch_remote(
        &self,
        job_posting_id: i64,
    ) -> Result<MatchingCacheResponse, ClientError> {
        let url = format!(
            "{}/api/matching/cache?jobPostingId={job_posting_id}",
            self.base_url
        );

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.session_token)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["message"].as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| status.to_string());

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Subscribe-modal UI state as an explicit container instead of flags bound
/// to implicit storage. Persistence goes through the serialization boundary
/// below, nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeModalState {
    pub open: bool,
    pub pending_tier: Option<String>,
}

impl SubscribeModalState {
    pub fn serialize_to_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn deserialize_from_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_the_hook_contract() {
        let policy = CachePolicy::default();

        assert_eq!(policy.stale_after, Duration::from_secs(300));
        assert_eq!(policy.retain_for, Duration::from_secs(1800));
        assert!(!policy.refetch_on_focus);
        assert!(!policy.refetch_on_reconnect);
        assert!(policy.refetch_interval.is_none());
    }

    #[test]
    fn entry_state_transitions_at_the_policy_boundaries() {
        let policy = CachePolicy::default();

        assert_eq!(entry_state(Duration::from_secs(0), &policy), EntryState::Fresh);
        assert_eq!(
            entry_state(Duration::from_secs(299), &policy),
            EntryState::Fresh
        );
        assert_eq!(
            entry_state(Duration::from_secs(300), &policy),
            EntryState::Stale
        );
        assert_eq!(
            entry_state(Duration::from_secs(1799), &policy),
            EntryState::Stale
        );
        assert_eq!(
            entry_state(Duration::from_secs(1800), &policy),
            EntryState::Expired
        );
    }

    #[tokio::test]
    async fn invalidate_forces_the_next_read_to_refetch() {
        let client = MatchingCacheClient::new("http://localhost:1", "token").unwrap();

        {
            let mut entries = client.entries.lock().await;
            entries.insert(
                7,
                CacheEntry {
                    response: MatchingCacheResponse {
                        success: true,
                        matches: vec![],
                        total: 0,
                        from_cache: true,
                        cached_at: chrono::Utc::now(),
                    },
                    fetched_at: Instant::now(),
                },
            );
        }

        // fresh entry short-circuits, no server needed
        assert!(client.cached_matches(7).await.is_ok());

        client.invalidate(7).await;

        // nothing cached and nothing listening on the port: the read fails
        assert!(client.cached_matches(7).await.is_err());
    }

    #[test]
    fn modal_state_round_trips_through_the_boundary() {
        let state = SubscribeModalState {
            open: true,
            pending_tier: Some("PREMIUM".into()),
        };

        let raw = state.serialize_to_string().unwrap();
        let restored = SubscribeModalState::deserialize_from_str(&raw).unwrap();
        assert_eq!(restored, state);

        assert_eq!(
            SubscribeModalState::deserialize_from_str("{}").unwrap(),
            SubscribeModalState::default()
        );
    }
}
