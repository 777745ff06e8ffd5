//! History Tracker
//!
//! Reads an actor's recent interactions for two purposes:
//! - exclusion: forks interacted with inside the trailing seen window
//! - diversity: a frequency map of recent interaction kinds
//!
//! Both lookups are best-effort. A store error or a blown deadline yields an
//! empty result.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::db::InteractionStore;
use crate::metrics;
use crate::models::Interaction;

#[derive(Clone)]
pub struct HistoryTracker {
    store: Arc<dyn InteractionStore>,
    seen_window: ChronoDuration,
    history_limit: i64,
    timeout: Duration,
}

impl HistoryTracker {
    pub fn new(
        store: Arc<dyn InteractionStore>,
        seen_window: ChronoDuration,
        history_limit: i64,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            seen_window,
            history_limit,
            timeout,
        }
    }

    /// Fork ids the actor touched within the seen window ending at `now`
    pub async fn seen_ids(&self, actor_id: Uuid, now: DateTime<Utc>) -> HashSet<Uuid> {
        let since = now - self.seen_window;

        match tokio::time::timeout(self.timeout, self.store.seen_ids(actor_id, since)).await {
            Ok(Ok(ids)) => ids,
            Ok(Err(e)) => {
                warn!(actor_id = %actor_id, error = %e, "Seen-id lookup failed, not excluding");
                metrics::record_degraded_lookup("seen_ids", "error");
                HashSet::new()
            }
            Err(_) => {
                warn!(actor_id = %actor_id, "Seen-id lookup timed out, not excluding");
                metrics::record_degraded_lookup("seen_ids", "timeout");
                HashSet::new()
            }
        }
    }

    /// The actor's latest interactions, newest first
    pub async fn recent_interactions(&self, actor_id: Uuid) -> Vec<Interaction> {
        let lookup = self.store.recent_interactions(actor_id, self.history_limit);

        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(interactions)) => interactions,
            Ok(Err(e)) => {
                warn!(actor_id = %actor_id, error = %e, "Recent-history lookup failed");
                metrics::record_degraded_lookup("recent_interactions", "error");
                Vec::new()
            }
            Err(_) => {
                warn!(actor_id = %actor_id, "Recent-history lookup timed out");
                metrics::record_degraded_lookup("recent_interactions", "timeout");
                Vec::new()
            }
        }
    }
}

/// Count interactions per kind label ("skip", "twist", ...)
pub fn kind_frequencies(interactions: &[Interaction]) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for interaction in interactions {
        *freq.entry(interaction.interaction_type.clone()).or_insert(0) += 1;
    }
    freq
}
