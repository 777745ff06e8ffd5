//! Feed generation
//!
//! One call produces one page:
//! 1. exclusion set and recent history, fetched concurrently and best-effort
//! 2. candidate batch of `limit * 3` from the store (fatal on failure)
//! 3. score and stable sort, truncate to `limit`
//! 4. a next cursor when the raw batch was full

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cache::SessionStore;
use crate::cursor;
use crate::db::CandidateSource;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{CandidateFilter, FeedPage, Session};
use crate::services::history::{kind_frequencies, HistoryTracker};
use crate::services::ranking::rank_forks;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;
pub const OVERFETCH_FACTOR: i64 = 3;

/// Out-of-range or missing page sizes fall back to the default
pub fn normalize_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(l) if (1..=MAX_PAGE_SIZE).contains(&l) => l,
        _ => DEFAULT_PAGE_SIZE,
    }
}

#[derive(Clone)]
pub struct FeedService {
    candidates: Arc<dyn CandidateSource>,
    history: HistoryTracker,
    sessions: SessionStore,
    fetch_timeout: Duration,
}

impl FeedService {
    pub fn new(
        candidates: Arc<dyn CandidateSource>,
        history: HistoryTracker,
        sessions: SessionStore,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            candidates,
            history,
            sessions,
            fetch_timeout,
        }
    }

    /// Build one ranked page for `actor_id`.
    ///
    /// `limit` is normalized to 1..=50 (default 20). An unreadable cursor
    /// starts from the first page.
    pub async fn get_feed(
        &self,
        actor_id: Uuid,
        session: &Session,
        cursor_token: Option<&str>,
        limit: Option<i64>,
    ) -> Result<FeedPage> {
        let limit = normalize_limit(limit);
        let offset = cursor::decode(cursor_token);
        let now = Utc::now();

        let (seen, recent) = tokio::join!(
            self.history.seen_ids(actor_id, now),
            self.history.recent_interactions(actor_id),
        );
        let kind_freq = kind_frequencies(&recent);

        let filter = CandidateFilter::from(session);
        let fetch_limit = limit * OVERFETCH_FACTOR;
        let fetch = self
            .candidates
            .fetch_candidates(&filter, &seen, fetch_limit, offset);

        let candidates = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(forks)) => forks,
            Ok(Err(e)) => {
                error!(actor_id = %actor_id, error = %e, "Candidate fetch failed");
                metrics::record_feed_request("unavailable");
                return Err(AppError::FeedUnavailable(e.to_string()));
            }
            Err(_) => {
                error!(
                    actor_id = %actor_id,
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "Candidate fetch timed out"
                );
                metrics::record_feed_request("unavailable");
                return Err(AppError::FeedUnavailable(
                    "candidate fetch timed out".to_string(),
                ));
            }
        };

        let batch_len = candidates.len() as i64;
        let mut forks = rank_forks(candidates, session, &kind_freq, now);
        forks.truncate(limit as usize);

        let next_cursor = if batch_len == fetch_limit {
            Some(cursor::encode(offset.saturating_add(limit)))
        } else {
            None
        };

        info!(
            actor_id = %actor_id,
            lane = session.lane.as_deref().unwrap_or(""),
            energy = session.energy.as_deref().unwrap_or(""),
            offset = offset,
            excluded = seen.len(),
            candidates = batch_len,
            returned = forks.len(),
            has_more = next_cursor.is_some(),
            "Feed generated"
        );
        metrics::record_feed_request("ok");

        Ok(FeedPage { forks, next_cursor })
    }

    /// Replace the actor's stored preference (24h TTL, last write wins)
    pub async fn update_session(&self, actor_id: Uuid, session: &Session) -> Result<()> {
        self.sessions.put(actor_id, session).await
    }

    /// Stored preference; unreadable state counts as no preference
    pub async fn get_session(&self, actor_id: Uuid) -> Session {
        match self.sessions.get(actor_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!(actor_id = %actor_id, error = %e, "Session read failed, using empty session");
                metrics::record_degraded_lookup("session", "error");
                Session::default()
            }
        }
    }
}
