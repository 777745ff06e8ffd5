//! Shared fixtures for integration tests
//!
//! In-memory stand-ins for Postgres and Redis that honor the same contracts
//! as the real repositories: recency order, exclusion, optional filters and
//! counters aggregated from recorded interactions.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use fork_feed::cache::{KeyValueCache, SessionStore};
use fork_feed::db::{CandidateSource, ForkStore, InteractionStore};
use fork_feed::error::{AppError, Result};
use fork_feed::middleware::Claims;
use fork_feed::models::{CandidateFilter, Fork, Interaction, InteractionKind, Report};
use fork_feed::services::{FeedService, ForkService, HistoryTracker, RateLimiter};

pub const SECRET: &str = "integration-secret";

pub fn bearer(actor_id: Uuid) -> String {
    let claims = Claims {
        sub: actor_id.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub fn fork(lane: &str, energy: Option<&str>, created_at: DateTime<Utc>) -> Fork {
    Fork {
        id: Uuid::new_v4(),
        prompt: format!("{} prompt", lane),
        left_label: "Left".to_string(),
        right_label: "Right".to_string(),
        left_asset_id: None,
        right_asset_id: None,
        intent_lane: lane.to_string(),
        mood: None,
        energy: energy.map(str::to_string),
        time_fit_s: None,
        cognitive_load: None,
        parent_fork_id: None,
        mutation_type: None,
        safety_age_gate: "all".to_string(),
        safety_sensitivity: "normal".to_string(),
        safety_flags: vec![],
        created_by_actor_id: Uuid::new_v4(),
        created_by_mask_id: None,
        created_at,
        left_count: 0,
        right_count: 0,
        skip_count: 0,
        twist_count: 0,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    forks: Mutex<Vec<Fork>>,
    interactions: Mutex<Vec<Interaction>>,
    reports: Mutex<Vec<Report>>,
}

impl MemoryStore {
    pub fn seed(&self, fork: Fork) -> Uuid {
        let id = fork.id;
        self.forks.lock().unwrap().push(fork);
        id
    }

    pub fn record(&self, actor_id: Uuid, fork_id: Uuid, kind: InteractionKind, at: DateTime<Utc>) {
        self.interactions.lock().unwrap().push(Interaction {
            id: Uuid::new_v4(),
            actor_id,
            fork_id,
            interaction_type: kind.as_str().to_string(),
            dwell_ms: None,
            created_at: at,
        });
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.lock().unwrap().len()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }

    fn with_counters(&self, mut fork: Fork) -> Fork {
        for i in self.interactions.lock().unwrap().iter() {
            if i.fork_id != fork.id {
                continue;
            }
            match i.interaction_type.as_str() {
                "swipe_left" => fork.left_count += 1,
                "swipe_right" => fork.right_count += 1,
                "skip" => fork.skip_count += 1,
                "twist" => fork.twist_count += 1,
                _ => {}
            }
        }
        fork
    }

    fn newest_first(&self) -> Vec<Fork> {
        let mut forks = self.forks.lock().unwrap().clone();
        forks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        forks
    }
}

#[async_trait]
impl CandidateSource for MemoryStore {
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        exclude: &HashSet<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Fork>> {
        let matching: Vec<Fork> = self
            .newest_first()
            .into_iter()
            .filter(|f| filter.lane.as_ref().map_or(true, |l| *l == f.intent_lane))
            .filter(|f| {
                filter
                    .energy
                    .as_ref()
                    .map_or(true, |e| f.energy.as_ref() == Some(e))
            })
            .filter(|f| !exclude.contains(&f.id))
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(matching.into_iter().map(|f| self.with_counters(f)).collect())
    }
}

#[async_trait]
impl ForkStore for MemoryStore {
    async fn insert_fork(&self, fork: &Fork) -> Result<()> {
        self.forks.lock().unwrap().push(fork.clone());
        Ok(())
    }

    async fn get_fork(&self, id: Uuid) -> Result<Option<Fork>> {
        let found = self
            .forks
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned();
        Ok(found.map(|f| self.with_counters(f)))
    }

    async fn get_children(&self, parent_id: Uuid) -> Result<Vec<Fork>> {
        Ok(self
            .newest_first()
            .into_iter()
            .filter(|f| f.parent_fork_id == Some(parent_id))
            .map(|f| self.with_counters(f))
            .collect())
    }

    async fn insert_report(&self, report: &Report) -> Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

#[async_trait]
impl InteractionStore for MemoryStore {
    async fn seen_ids(&self, actor_id: Uuid, since: DateTime<Utc>) -> Result<HashSet<Uuid>> {
        Ok(self
            .interactions
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.actor_id == actor_id && i.created_at >= since)
            .map(|i| i.fork_id)
            .collect())
    }

    async fn recent_interactions(&self, actor_id: Uuid, limit: i64) -> Result<Vec<Interaction>> {
        let mut mine: Vec<Interaction> = self
            .interactions
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.actor_id == actor_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit as usize);
        Ok(mine)
    }

    async fn count_actions(
        &self,
        actor_id: Uuid,
        kind: InteractionKind,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        Ok(self
            .interactions
            .lock()
            .unwrap()
            .iter()
            .filter(|i| {
                i.actor_id == actor_id
                    && i.interaction_type == kind.as_str()
                    && i.created_at >= since
            })
            .count() as i64)
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()> {
        self.interactions.lock().unwrap().push(interaction.clone());
        Ok(())
    }
}

/// Candidate source that always fails
pub struct BrokenCandidates;

#[async_trait]
impl CandidateSource for BrokenCandidates {
    async fn fetch_candidates(
        &self,
        _filter: &CandidateFilter,
        _exclude: &HashSet<Uuid>,
        _limit: i64,
        _offset: i64,
    ) -> Result<Vec<Fork>> {
        Err(AppError::Database("connection refused".to_string()))
    }
}

/// Candidate source that never answers within a request deadline
pub struct StalledCandidates;

#[async_trait]
impl CandidateSource for StalledCandidates {
    async fn fetch_candidates(
        &self,
        _filter: &CandidateFilter,
        _exclude: &HashSet<Uuid>,
        _limit: i64,
        _offset: i64,
    ) -> Result<Vec<Fork>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }
}

/// Interaction store whose history reads never finish in time
pub struct StalledHistory;

#[async_trait]
impl InteractionStore for StalledHistory {
    async fn seen_ids(&self, _actor_id: Uuid, _since: DateTime<Utc>) -> Result<HashSet<Uuid>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(HashSet::new())
    }

    async fn recent_interactions(&self, _actor_id: Uuid, _limit: i64) -> Result<Vec<Interaction>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }

    async fn count_actions(
        &self,
        _actor_id: Uuid,
        _kind: InteractionKind,
        _since: DateTime<Utc>,
    ) -> Result<i64> {
        Ok(0)
    }

    async fn insert_interaction(&self, _interaction: &Interaction) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
}

impl MemoryCache {
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }
}

/// Services wired over the in-memory fakes
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub feed: FeedService,
    pub forks: ForkService,
}

pub fn history_over(store: Arc<dyn InteractionStore>, timeout: Duration) -> HistoryTracker {
    HistoryTracker::new(store, ChronoDuration::hours(24), 100, timeout)
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(MemoryCache::default());
        Self::with_candidates(store.clone(), store, cache)
    }

    pub fn with_candidates(
        candidates: Arc<dyn CandidateSource>,
        store: Arc<MemoryStore>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self::with_fetch_timeout(candidates, store, cache, Duration::from_secs(2))
    }

    pub fn with_fetch_timeout(
        candidates: Arc<dyn CandidateSource>,
        store: Arc<MemoryStore>,
        cache: Arc<MemoryCache>,
        fetch_timeout: Duration,
    ) -> Self {
        let interactions: Arc<dyn InteractionStore> = store.clone();
        let feed = FeedService::new(
            candidates,
            history_over(interactions.clone(), Duration::from_millis(500)),
            SessionStore::new(cache.clone(), Duration::from_secs(86_400)),
            fetch_timeout,
        );
        let limiter = RateLimiter::for_creation(interactions.clone(), 10);
        let forks = ForkService::new(store.clone(), interactions, limiter);

        Self {
            store,
            cache,
            feed,
            forks,
        }
    }
}
